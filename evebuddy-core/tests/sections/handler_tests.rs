// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for section handlers and routing

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use evebuddy_core::section::catalog::{character, corporation};
use evebuddy_core::{
    BoxError, EntityId, SectionHandler, SectionId, UpdateContext, UpdateError, UpdateRequest,
};

use crate::common::Fixture;

#[derive(Debug, Clone, Serialize)]
struct JournalEntry {
    id: i64,
    amount: f64,
}

/// Serves the seven wallet journal divisions of a corporation.
struct WalletJournalHandler {
    sections: Vec<SectionId>,
    remote: Mutex<BTreeMap<(SectionId, EntityId), Vec<JournalEntry>>>,
    local: Arc<Mutex<Vec<(SectionId, EntityId, usize)>>>,
}

impl WalletJournalHandler {
    fn new() -> Self {
        Self {
            sections: corporation::WALLET_JOURNALS.to_vec(),
            remote: Mutex::default(),
            local: Arc::default(),
        }
    }

    fn publish(&self, section: SectionId, entity_id: EntityId, entries: Vec<JournalEntry>) {
        self.remote.lock().insert((section, entity_id), entries);
    }
}

impl SectionHandler for WalletJournalHandler {
    type Payload = Vec<JournalEntry>;

    fn sections(&self) -> &[SectionId] {
        &self.sections
    }

    fn fetch(
        &self,
        _ctx: &UpdateContext,
        section: &SectionId,
        entity_id: EntityId,
    ) -> Result<Self::Payload, BoxError> {
        self.remote
            .lock()
            .get(&(section.clone(), entity_id))
            .cloned()
            .ok_or_else(|| format!("no journal for division {section}").into())
    }

    fn apply(
        &self,
        _ctx: &UpdateContext,
        section: &SectionId,
        entity_id: EntityId,
        payload: Self::Payload,
    ) -> Result<(), BoxError> {
        self.local
            .lock()
            .push((section.clone(), entity_id, payload.len()));
        Ok(())
    }
}

fn entries(n: i64) -> Vec<JournalEntry> {
    (0..n)
        .map(|id| JournalEntry {
            id,
            amount: id as f64 * 1_000.5,
        })
        .collect()
}

#[test]
fn test_update_with_handler_passes_section() {
    let fixture = Fixture::new();
    let handler = WalletJournalHandler::new();
    handler.publish(corporation::WALLET_JOURNAL_3, 98000001, entries(4));

    let req = UpdateRequest::new(98000001, corporation::WALLET_JOURNAL_3);
    let changed = fixture
        .updater
        .update_section_with(&UpdateContext::new(), &req, &handler)
        .unwrap();

    assert!(changed);
    assert_eq!(
        *handler.local.lock(),
        vec![(corporation::WALLET_JOURNAL_3, 98000001, 4)]
    );
}

#[test]
#[should_panic(expected = "handler does not serve section")]
fn test_mismatched_handler_panics() {
    let fixture = Fixture::new();
    let handler = WalletJournalHandler::new();
    let req = UpdateRequest::new(98000001, corporation::WALLET_TRANSACTIONS_1);

    let _ = fixture
        .updater
        .update_section_with(&UpdateContext::new(), &req, &handler);
}

#[test]
fn test_registered_handler_routes_all_its_sections() {
    let handler = WalletJournalHandler::new();
    for (i, section) in corporation::WALLET_JOURNALS.into_iter().enumerate() {
        handler.publish(section, 98000001, entries(i as i64 + 1));
    }
    let local = Arc::clone(&handler.local);
    let fixture = Fixture::build(|builder| builder.handler(handler));

    for section in corporation::WALLET_JOURNALS {
        assert!(fixture.updater.has_handler(&section));
        let req = UpdateRequest::new(98000001, section);
        assert!(fixture
            .updater
            .update_registered_section(&UpdateContext::new(), &req)
            .unwrap());
    }

    let local = local.lock();
    assert_eq!(local.len(), 7);
    assert_eq!(local[6], (corporation::WALLET_JOURNAL_7, 98000001, 7));
}

#[test]
fn test_registered_handler_errors_are_recorded() {
    let fixture = Fixture::build(|builder| builder.handler(WalletJournalHandler::new()));
    let req = UpdateRequest::new(98000001, corporation::WALLET_JOURNAL_1);

    let err = fixture
        .updater
        .update_registered_section(&UpdateContext::new(), &req)
        .unwrap_err();

    assert!(matches!(err, UpdateError::Fetch { .. }));
    let status = fixture.updater.section_status(&req.key()).unwrap().unwrap();
    assert_eq!(
        status.error_message,
        "no journal for division corporation:wallet_journal_1"
    );
}

#[test]
fn test_unregistered_section_has_no_handler() {
    let fixture = Fixture::build(|builder| builder.handler(WalletJournalHandler::new()));
    let req = UpdateRequest::new(42, character::WALLET_JOURNAL);

    assert!(!fixture.updater.has_handler(&req.section));
    let err = fixture
        .updater
        .update_registered_section(&UpdateContext::new(), &req)
        .unwrap_err();
    assert!(matches!(err, UpdateError::NoHandler(_)));
}
