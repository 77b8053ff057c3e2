// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Duplicate call suppression
//!
//! [`SingleFlight`] runs at most one call per key at a time. Callers that
//! arrive while a call for their key is in flight block until it finishes and
//! receive a clone of its result instead of running their own closure.
//!
//! Waiting callers cannot cancel the in-flight call. If the leading call
//! panics, waiters do not inherit the panic: each retries, and one of them
//! becomes the new leader.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Map of in-flight calls keyed by string.
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, Arc<Call<T>>>>,
}

struct Call<T> {
    state: Mutex<CallState<T>>,
    done: Condvar,
}

enum CallState<T> {
    Running { waiters: usize },
    Done(T),
    Abandoned,
}

enum Role<T> {
    Leader(Arc<Call<T>>),
    Waiter(Arc<Call<T>>),
}

impl<T> Call<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(CallState::Running { waiters: 0 }),
            done: Condvar::new(),
        }
    }

    fn finish(&self, outcome: CallState<T>) {
        *self.state.lock() = outcome;
        self.done.notify_all();
    }

    fn waiters(&self) -> usize {
        match *self.state.lock() {
            CallState::Running { waiters } => waiters,
            _ => 0,
        }
    }
}

impl<T: Clone> Call<T> {
    /// Blocks until the leader settles. `None` means the leader panicked.
    fn wait(&self) -> Option<T> {
        let mut state = self.state.lock();
        while matches!(*state, CallState::Running { .. }) {
            self.done.wait(&mut state);
        }
        match &*state {
            CallState::Done(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> SingleFlight<T> {
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` unless a call for `key` is already in flight, in which case
    /// this blocks and returns that call's result.
    ///
    /// The returned flag is `true` when the result was produced by another
    /// caller.
    pub fn execute<F>(&self, key: &str, f: F) -> (T, bool)
    where
        F: FnOnce() -> T,
    {
        loop {
            let call = match self.join(key) {
                Role::Leader(call) => return (self.lead(key, &call, f), false),
                Role::Waiter(call) => call,
            };
            if let Some(value) = call.wait() {
                return (value, true);
            }
        }
    }

    fn join(&self, key: &str) -> Role<T> {
        let mut calls = self.calls.lock();
        if let Some(call) = calls.get(key) {
            if let CallState::Running { waiters } = &mut *call.state.lock() {
                *waiters += 1;
            }
            return Role::Waiter(Arc::clone(call));
        }
        let call = Arc::new(Call::new());
        calls.insert(key.to_string(), Arc::clone(&call));
        Role::Leader(call)
    }

    fn lead<F>(&self, key: &str, call: &Arc<Call<T>>, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let mut guard = LeaderGuard {
            flight: self,
            key,
            call,
            armed: true,
        };
        let value = f();
        guard.armed = false;

        // Callers arriving from here on start a fresh call.
        self.release(key, call);
        call.finish(CallState::Done(value.clone()));
        value
    }

    fn release(&self, key: &str, call: &Arc<Call<T>>) {
        let mut calls = self.calls.lock();
        if calls.get(key).is_some_and(|c| Arc::ptr_eq(c, call)) {
            calls.remove(key);
        }
    }

    /// Whether a call for `key` is in flight.
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.calls.lock().contains_key(key)
    }

    /// Number of callers blocked on the in-flight call for `key`.
    pub fn waiting(&self, key: &str) -> usize {
        let call = self.calls.lock().get(key).cloned();
        call.map_or(0, |c| c.waiters())
    }

    /// Number of keys with a call in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

/// Wakes waiters of a leader that unwinds before producing a value.
struct LeaderGuard<'a, T: Clone> {
    flight: &'a SingleFlight<T>,
    key: &'a str,
    call: &'a Arc<Call<T>>,
    armed: bool,
}

impl<T: Clone> Drop for LeaderGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            self.flight.release(self.key, self.call);
            self.call.finish(CallState::Abandoned);
        }
    }
}
