// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Known sections per scope

/// Character sections.
pub mod character {
    use crate::section::SectionId;

    pub const ASSETS: SectionId = SectionId::character("assets");
    pub const ATTRIBUTES: SectionId = SectionId::character("attributes");
    pub const CONTRACTS: SectionId = SectionId::character("contracts");
    pub const IMPLANTS: SectionId = SectionId::character("implants");
    pub const INDUSTRY_JOBS: SectionId = SectionId::character("industry_jobs");
    pub const JUMP_CLONES: SectionId = SectionId::character("jump_clones");
    pub const LOCATION: SectionId = SectionId::character("location");
    pub const MAIL_LABELS: SectionId = SectionId::character("mail_labels");
    pub const MAIL_LISTS: SectionId = SectionId::character("mail_lists");
    pub const MAILS: SectionId = SectionId::character("mails");
    pub const NOTIFICATIONS: SectionId = SectionId::character("notifications");
    pub const ONLINE: SectionId = SectionId::character("online");
    pub const PLANETS: SectionId = SectionId::character("planets");
    pub const ROLES: SectionId = SectionId::character("roles");
    pub const SHIP: SectionId = SectionId::character("ship");
    pub const SKILLQUEUE: SectionId = SectionId::character("skillqueue");
    pub const SKILLS: SectionId = SectionId::character("skills");
    pub const WALLET_BALANCE: SectionId = SectionId::character("wallet_balance");
    pub const WALLET_JOURNAL: SectionId = SectionId::character("wallet_journal");
    pub const WALLET_TRANSACTIONS: SectionId = SectionId::character("wallet_transactions");

    /// All character sections.
    pub const ALL: &[SectionId] = &[
        ASSETS,
        ATTRIBUTES,
        CONTRACTS,
        IMPLANTS,
        INDUSTRY_JOBS,
        JUMP_CLONES,
        LOCATION,
        MAIL_LABELS,
        MAIL_LISTS,
        MAILS,
        NOTIFICATIONS,
        ONLINE,
        PLANETS,
        ROLES,
        SHIP,
        SKILLQUEUE,
        SKILLS,
        WALLET_BALANCE,
        WALLET_JOURNAL,
        WALLET_TRANSACTIONS,
    ];
}

/// Corporation sections. Wallet sections exist once per division (1-7).
pub mod corporation {
    use crate::section::SectionId;

    pub const DIVISIONS: SectionId = SectionId::corporation("divisions");
    pub const INDUSTRY_JOBS: SectionId = SectionId::corporation("industry_jobs");
    pub const WALLET_BALANCES: SectionId = SectionId::corporation("wallet_balances");
    pub const WALLET_JOURNAL_1: SectionId = SectionId::corporation("wallet_journal_1");
    pub const WALLET_JOURNAL_2: SectionId = SectionId::corporation("wallet_journal_2");
    pub const WALLET_JOURNAL_3: SectionId = SectionId::corporation("wallet_journal_3");
    pub const WALLET_JOURNAL_4: SectionId = SectionId::corporation("wallet_journal_4");
    pub const WALLET_JOURNAL_5: SectionId = SectionId::corporation("wallet_journal_5");
    pub const WALLET_JOURNAL_6: SectionId = SectionId::corporation("wallet_journal_6");
    pub const WALLET_JOURNAL_7: SectionId = SectionId::corporation("wallet_journal_7");
    pub const WALLET_TRANSACTIONS_1: SectionId = SectionId::corporation("wallet_transactions_1");
    pub const WALLET_TRANSACTIONS_2: SectionId = SectionId::corporation("wallet_transactions_2");
    pub const WALLET_TRANSACTIONS_3: SectionId = SectionId::corporation("wallet_transactions_3");
    pub const WALLET_TRANSACTIONS_4: SectionId = SectionId::corporation("wallet_transactions_4");
    pub const WALLET_TRANSACTIONS_5: SectionId = SectionId::corporation("wallet_transactions_5");
    pub const WALLET_TRANSACTIONS_6: SectionId = SectionId::corporation("wallet_transactions_6");
    pub const WALLET_TRANSACTIONS_7: SectionId = SectionId::corporation("wallet_transactions_7");

    /// Wallet journal sections, indexed by division - 1.
    pub const WALLET_JOURNALS: [SectionId; 7] = [
        WALLET_JOURNAL_1,
        WALLET_JOURNAL_2,
        WALLET_JOURNAL_3,
        WALLET_JOURNAL_4,
        WALLET_JOURNAL_5,
        WALLET_JOURNAL_6,
        WALLET_JOURNAL_7,
    ];

    /// Wallet transaction sections, indexed by division - 1.
    pub const WALLET_TRANSACTIONS: [SectionId; 7] = [
        WALLET_TRANSACTIONS_1,
        WALLET_TRANSACTIONS_2,
        WALLET_TRANSACTIONS_3,
        WALLET_TRANSACTIONS_4,
        WALLET_TRANSACTIONS_5,
        WALLET_TRANSACTIONS_6,
        WALLET_TRANSACTIONS_7,
    ];

    /// All corporation sections.
    pub const ALL: &[SectionId] = &[
        DIVISIONS,
        INDUSTRY_JOBS,
        WALLET_BALANCES,
        WALLET_JOURNAL_1,
        WALLET_JOURNAL_2,
        WALLET_JOURNAL_3,
        WALLET_JOURNAL_4,
        WALLET_JOURNAL_5,
        WALLET_JOURNAL_6,
        WALLET_JOURNAL_7,
        WALLET_TRANSACTIONS_1,
        WALLET_TRANSACTIONS_2,
        WALLET_TRANSACTIONS_3,
        WALLET_TRANSACTIONS_4,
        WALLET_TRANSACTIONS_5,
        WALLET_TRANSACTIONS_6,
        WALLET_TRANSACTIONS_7,
    ];

    /// Returns the wallet division (1-7) a section belongs to, if any.
    pub fn division(section: &SectionId) -> Option<u8> {
        WALLET_JOURNALS
            .iter()
            .position(|s| s == section)
            .or_else(|| WALLET_TRANSACTIONS.iter().position(|s| s == section))
            .map(|i| i as u8 + 1)
    }
}

/// Sections not owned by an entity.
pub mod general {
    use crate::section::SectionId;

    pub const CHARACTERS: SectionId = SectionId::general("characters");
    pub const CORPORATIONS: SectionId = SectionId::general("corporations");
    pub const ENTITIES: SectionId = SectionId::general("entities");
    pub const MARKET_PRICES: SectionId = SectionId::general("market_prices");
    pub const TYPES: SectionId = SectionId::general("types");

    /// All general sections.
    pub const ALL: &[SectionId] = &[CHARACTERS, CORPORATIONS, ENTITIES, MARKET_PRICES, TYPES];
}

use super::{SectionId, SectionScope};

/// Returns the known sections of a scope.
pub fn sections_for(scope: SectionScope) -> &'static [SectionId] {
    match scope {
        SectionScope::Character => character::ALL,
        SectionScope::Corporation => corporation::ALL,
        SectionScope::General => general::ALL,
    }
}

/// Whether a section is part of the catalog.
pub fn is_known(section: &SectionId) -> bool {
    sections_for(section.scope()).contains(section)
}
