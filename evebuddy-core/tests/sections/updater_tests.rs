// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the update decision, change detection and status bookkeeping

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use evebuddy_core::section::catalog::{character, corporation, general};
use evebuddy_core::{
    EntityId, SectionId, SectionKey, SectionScope, SectionStatus, StalenessPolicy, StatusPatch,
    StatusStore, Storage, StorageError, UpdateError, UpdateEvent, UpdateRequest,
};

use crate::common::{Fixture, Source, START_SECS};

fn status(fixture: &Fixture, key: &SectionKey) -> SectionStatus {
    fixture.updater.section_status(key).unwrap().unwrap()
}

// =============================================================================
// First run and skip path
// =============================================================================

#[test]
fn test_first_run_applies_and_records_success() {
    let fixture = Fixture::new();
    let source = Source::new(vec![1, 2, 3]);
    let req = UpdateRequest::new(42, character::SKILLQUEUE);

    assert!(source.update(&fixture.updater, &req).unwrap());
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(source.apply_count(), 1);

    let status = status(&fixture, &req.key());
    assert!(status.content_hash.starts_with("sha256:"));
    assert_eq!(status.error_message, "");
    assert_eq!(status.started_at, None);
    assert_eq!(
        status.completed_at,
        Some(UNIX_EPOCH + Duration::from_secs(START_SECS))
    );
    assert!(fixture.updater.has_section(&req.key()).unwrap());
}

#[test]
fn test_fresh_section_is_skipped_without_fetch() {
    let fixture = Fixture::new();
    let source = Source::new("balance".to_string());
    let req = UpdateRequest::new(42, character::WALLET_BALANCE);

    source.update(&fixture.updater, &req).unwrap();
    for _ in 0..3 {
        fixture.advance(30);
        assert!(!source.update(&fixture.updater, &req).unwrap());
    }

    assert_eq!(source.fetch_count(), 1);
    assert_eq!(source.apply_count(), 1);
}

#[test]
fn test_failed_section_is_not_skipped() {
    let fixture = Fixture::new();
    let source = Source::new(7u64);
    let req = UpdateRequest::new(42, character::SKILLS);

    source.update(&fixture.updater, &req).unwrap();

    fixture.advance(1);
    source.fail_fetch("esi unavailable");
    assert!(source.update(&fixture.updater, &req.clone().forced()).is_err());

    // Still within the timeout, but the last attempt failed.
    fixture.advance(1);
    source.heal();
    assert!(!source.update(&fixture.updater, &req).unwrap());
    assert_eq!(source.fetch_count(), 3);
}

#[test]
fn test_expired_section_is_fetched_again() {
    let fixture = Fixture::new();
    let source = Source::new(vec!["mail"]);
    let req = UpdateRequest::new(42, character::MAILS);

    source.update(&fixture.updater, &req).unwrap();
    fixture.advance(61);
    source.update(&fixture.updater, &req).unwrap();

    assert_eq!(source.fetch_count(), 2);
}

#[test]
fn test_unknown_section_uses_scope_default() {
    let fixture = Fixture::new();
    let source = Source::new(1);
    let req = UpdateRequest::new(42, SectionId::new(SectionScope::Character, "fittings"));

    source.update(&fixture.updater, &req).unwrap();
    fixture.advance(3600);
    source.update(&fixture.updater, &req).unwrap();
    assert_eq!(source.fetch_count(), 1);

    fixture.advance(1);
    source.update(&fixture.updater, &req).unwrap();
    assert_eq!(source.fetch_count(), 2);
}

#[test]
fn test_general_sections_use_entity_zero() {
    let fixture = Fixture::new();
    let source = Source::new(vec![34, 35, 36]);
    let req = UpdateRequest::general(general::TYPES);

    assert!(source.update(&fixture.updater, &req).unwrap());
    let statuses = fixture
        .updater
        .list_statuses(SectionScope::General, 0)
        .unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].key, SectionKey::general(general::TYPES));
}

#[test]
fn test_invalid_requests_touch_nothing() {
    let fixture = Fixture::new();
    let source = Source::new(1);

    let err = source
        .update(&fixture.updater, &UpdateRequest::new(0, corporation::DIVISIONS))
        .unwrap_err();
    assert!(matches!(err, UpdateError::InvalidRequest(_)));
    assert_eq!(err.key(), None);
    assert_eq!(source.fetch_count(), 0);
    assert_eq!(fixture.storage.count_section_statuses().unwrap(), 0);
}

// =============================================================================
// Change detection
// =============================================================================

#[test]
fn test_identical_payload_does_not_apply() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::SKILLS);

    let first: HashMap<String, i32> = (0..50).map(|i| (format!("skill_{i}"), i)).collect();
    let second: HashMap<String, i32> = (0..50).rev().map(|i| (format!("skill_{i}"), i)).collect();
    let source = Source::new(first);

    assert!(source.update(&fixture.updater, &req).unwrap());
    let hash = status(&fixture, &req.key()).content_hash;

    fixture.advance(121);
    source.set_payload(second);
    assert!(!source.update(&fixture.updater, &req).unwrap());

    assert_eq!(source.fetch_count(), 2);
    assert_eq!(source.apply_count(), 1);
    assert_eq!(status(&fixture, &req.key()).content_hash, hash);
}

#[test]
fn test_changed_payload_applies_once() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::SKILLS);
    let source = Source::new(vec![1, 2]);

    source.update(&fixture.updater, &req).unwrap();
    let before = status(&fixture, &req.key()).content_hash;

    fixture.advance(121);
    source.set_payload(vec![1, 2, 3]);
    assert!(source.update(&fixture.updater, &req).unwrap());

    assert_eq!(source.apply_count(), 2);
    assert_eq!(source.applied.lock().last(), Some(&vec![1, 2, 3]));
    assert_ne!(status(&fixture, &req.key()).content_hash, before);
}

#[test]
fn test_force_applies_unchanged_payload() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::SKILLS);
    let source = Source::new(vec![1, 2]);

    source.update(&fixture.updater, &req).unwrap();
    let changed = source.update(&fixture.updater, &req.clone().forced()).unwrap();

    assert!(!changed);
    assert_eq!(source.fetch_count(), 2);
    assert_eq!(source.apply_count(), 2);
}

#[test]
fn test_skip_change_detection_always_applies() {
    let policy = StalenessPolicy::eve_defaults()
        .to_builder()
        .skip_change_detection(character::LOCATION)
        .build();
    let fixture = Fixture::with_policy(policy);
    let req = UpdateRequest::new(42, character::LOCATION);
    let source = Source::new(30000142);

    assert!(source.update(&fixture.updater, &req).unwrap());
    fixture.advance(301);
    assert!(!source.update(&fixture.updater, &req).unwrap());

    assert_eq!(source.apply_count(), 2);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_fetch_failure_preserves_fingerprint() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::ASSETS);
    let source = Source::new(vec!["Rifter"]);

    source.update(&fixture.updater, &req).unwrap();
    let good = status(&fixture, &req.key());

    fixture.advance(3601);
    source.fail_fetch("esi returned 503");
    let err = source.update(&fixture.updater, &req).unwrap_err();

    assert!(matches!(&err, UpdateError::Fetch { key, .. } if key == &req.key()));
    assert!(err.to_string().contains("character 42 / assets"));

    let failed = status(&fixture, &req.key());
    assert_eq!(failed.content_hash, good.content_hash);
    assert_eq!(failed.completed_at, good.completed_at);
    assert_eq!(failed.error_message, "esi returned 503");
    assert!(!failed.is_running());
    assert_eq!(source.apply_count(), 1);
}

#[test]
fn test_apply_failure_preserves_fingerprint() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::ASSETS);
    let source = Source::new(vec!["Rifter"]);

    source.update(&fixture.updater, &req).unwrap();
    let good = status(&fixture, &req.key());

    fixture.advance(3601);
    source.set_payload(vec!["Rifter", "Merlin"]);
    source.fail_apply("database is locked");
    let err = source.update(&fixture.updater, &req).unwrap_err();

    assert!(matches!(err, UpdateError::Apply { .. }));
    let failed = status(&fixture, &req.key());
    assert_eq!(failed.content_hash, good.content_hash);
    assert_eq!(failed.completed_at, good.completed_at);
    assert_eq!(failed.error_message, "database is locked");

    // The retry still sees the new payload as changed.
    source.heal();
    assert!(source.update(&fixture.updater, &req).unwrap());
}

#[test]
fn test_error_clears_on_next_success() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::IMPLANTS);
    let source = Source::new(vec![22118]);

    source.fail_fetch("timeout");
    source.update(&fixture.updater, &req).unwrap_err();
    let failed = status(&fixture, &req.key());
    assert!(failed.has_error());
    assert_eq!(failed.completed_at, None);

    fixture.advance(5);
    source.heal();
    source.update(&fixture.updater, &req).unwrap();

    let ok = status(&fixture, &req.key());
    assert_eq!(ok.error_message, "");
    assert_eq!(
        ok.completed_at,
        Some(UNIX_EPOCH + Duration::from_secs(START_SECS + 5))
    );
}

#[test]
fn test_unencodable_payload_is_an_encoding_error() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::PLANETS);
    let payload: HashMap<(i32, i32), i32> = [((1, 2), 3)].into_iter().collect();
    let source = Source::new(payload);

    let err = source.update(&fixture.updater, &req).unwrap_err();

    assert!(matches!(err, UpdateError::Encoding { .. }));
    assert_eq!(source.apply_count(), 0);
    assert!(status(&fixture, &req.key()).has_error());
}

struct BrokenStore;

impl StatusStore for BrokenStore {
    fn get(&self, _key: &SectionKey) -> Result<Option<SectionStatus>, StorageError> {
        Err(StorageError::InvalidData("corrupt row".into()))
    }

    fn upsert(&self, _key: &SectionKey, _patch: &StatusPatch) -> Result<SectionStatus, StorageError> {
        Err(StorageError::InvalidData("read-only".into()))
    }

    fn list(
        &self,
        _scope: SectionScope,
        _entity_id: EntityId,
    ) -> Result<Vec<SectionStatus>, StorageError> {
        Ok(Vec::new())
    }
}

#[test]
fn test_status_read_failure_is_reported() {
    let fixture = Fixture::build(|builder| builder.store(Arc::new(BrokenStore)));
    let source = Source::new(1);
    let req = UpdateRequest::new(42, character::ROLES);

    let err = source.update(&fixture.updater, &req).unwrap_err();
    assert!(matches!(err, UpdateError::Storage { .. }));
    assert_eq!(source.fetch_count(), 0);

    // Forced updates skip the read but cannot mark the section running.
    let err = source
        .update(&fixture.updater, &req.clone().forced())
        .unwrap_err();
    assert!(matches!(err, UpdateError::Storage { .. }));
    assert_eq!(source.fetch_count(), 0);
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn test_events_follow_the_update() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::ONLINE);
    let source = Source::new(true);

    source.update(&fixture.updater, &req).unwrap();
    let events = fixture.take_events();

    assert_eq!(events.len(), 4);
    assert_eq!(
        events[0],
        UpdateEvent::Started {
            key: req.key(),
            forced: false
        }
    );
    assert!(matches!(&events[1], UpdateEvent::StatusRecorded { status } if status.is_running()));
    assert!(matches!(&events[2], UpdateEvent::StatusRecorded { status } if status.has_content()));
    assert_eq!(
        events[3],
        UpdateEvent::Completed {
            key: req.key(),
            changed: true
        }
    );

    // Skipped calls are silent.
    source.update(&fixture.updater, &req).unwrap();
    assert!(fixture.take_events().is_empty());
}

#[test]
fn test_failure_event_carries_message() {
    let fixture = Fixture::new();
    let req = UpdateRequest::new(42, character::ONLINE);
    let source = Source::new(true);
    source.fail_fetch("token expired");

    source.update(&fixture.updater, &req).unwrap_err();
    let events = fixture.take_events();

    assert_eq!(
        events.last(),
        Some(&UpdateEvent::Failed {
            key: req.key(),
            error: "token expired".to_string()
        })
    );
}

#[test]
fn test_statuses_survive_in_shared_storage() {
    let storage = Arc::new(Storage::in_memory().unwrap());
    let fixture = Fixture::build(|builder| builder.store(storage.clone()));
    let source = Source::new(vec![1]);
    let req = UpdateRequest::new(7, character::CONTRACTS);

    source.update(&fixture.updater, &req).unwrap();

    let stored = storage.get(&req.key()).unwrap().unwrap();
    assert!(stored.has_content());
    // The fixture's own storage is not the one in use.
    assert_eq!(fixture.storage.count_section_statuses().unwrap(), 0);
}
