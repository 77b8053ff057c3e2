// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the status cache following a live updater

use std::sync::Arc;

use evebuddy_core::section::catalog::{character, general};
use evebuddy_core::{
    Clock, Roster, SectionKey, SectionScope, StalenessPolicy, StatusCache, UpdateRequest,
};

use crate::common::{Fixture, Source};

fn wired() -> (Fixture, Arc<StatusCache>) {
    let cache = Arc::new(StatusCache::new(Arc::new(StalenessPolicy::eve_defaults())));
    let sink = Arc::clone(&cache);
    let fixture = Fixture::build(move |builder| builder.event_handler(sink));
    (fixture, cache)
}

#[test]
fn test_cache_tracks_updates() {
    let (fixture, cache) = wired();
    let source = Source::new(vec![1, 2]);
    let req = UpdateRequest::new(42, character::SKILLQUEUE);

    source.update(&fixture.updater, &req).unwrap();

    let cached = cache.get(&req.key()).unwrap();
    let stored = fixture.updater.section_status(&req.key()).unwrap().unwrap();
    assert_eq!(cached, stored);
    assert!(cache.has_section(&req.key()));
}

#[test]
fn test_cache_tracks_failures() {
    let (fixture, cache) = wired();
    let source = Source::new(vec![1, 2]);
    source.fail_fetch("esi down");
    let req = UpdateRequest::new(42, character::SKILLQUEUE);

    source.update(&fixture.updater, &req).unwrap_err();

    let view = cache.section_view(&req.key());
    assert!(view.has_error());
    assert!(!view.is_running());
    assert_eq!(view.display_name, "Skillqueue");
}

#[test]
fn test_summary_over_roster() {
    let (fixture, cache) = wired();
    let source = Source::new(1);

    for section in character::ALL {
        source
            .update(&fixture.updater, &UpdateRequest::new(42, section.clone()))
            .unwrap();
    }
    source
        .update(&fixture.updater, &UpdateRequest::general(general::TYPES))
        .unwrap();

    let roster = Roster::new().with_character(42);
    let now = fixture.clock.now();
    let summary = cache.summary(&roster, now);
    assert_eq!(summary.total, character::ALL.len() + general::ALL.len());
    assert_eq!(summary.current, character::ALL.len() + 1);
    assert_eq!(summary.missing, general::ALL.len() - 1);
    assert_eq!(summary.errors, 0);
    assert!(!summary.is_running);

    let character_only = cache.entity_summary(SectionScope::Character, 42, now);
    assert!(character_only.is_ok());
    assert_eq!(character_only.percent_current(), 100);
}

#[test]
fn test_cache_initializes_from_storage() {
    let fixture = Fixture::new();
    let source = Source::new(1);
    source
        .update(&fixture.updater, &UpdateRequest::new(42, character::ASSETS))
        .unwrap();
    source
        .update(&fixture.updater, &UpdateRequest::new(43, character::ASSETS))
        .unwrap();

    let cache = StatusCache::new(Arc::clone(fixture.updater.policy()));
    cache
        .init_from_store(fixture.storage.as_ref(), &Roster::new().with_character(42))
        .unwrap();

    assert!(cache.has_section(&SectionKey::new(42, character::ASSETS)));
    assert!(!cache.has_section(&SectionKey::new(43, character::ASSETS)));
    assert_eq!(cache.list_sections(SectionScope::Character, 42).len(), character::ALL.len());
}
