// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the section update engine
//!
//! Covers skipping fresh sections, change detection, failure bookkeeping,
//! concurrent refreshes and handler routing.

#[path = "../common/mod.rs"]
mod common;

mod handler_tests;
mod status_cache_tests;
mod updater_tests;
