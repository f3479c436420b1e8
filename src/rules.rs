//-
// Copyright (c) 2026, Jason Lingle
//
// This file is part of virtual-keywords.
//
// virtual-keywords is free software: you can redistribute it and/or modify it
// under the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// virtual-keywords is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along with
// virtual-keywords. If not, see <http://www.gnu.org/licenses/>.

//! Construction of virtual mailbox rule files.
//!
//! A rule file has two parts. The first is either a list of mailbox patterns
//! (one per line, `-` excluding a pattern) or the name of a single enclosing
//! virtual mailbox. The second is a search expression indented by two spaces.
//! For example, the rule file for a keyword looks like
//!
//! ```text
//! Virtual.All
//!   KEYWORD Work
//! ```
//!
//! Everything other than `All` itself is scoped within `All`, so that trashed
//! messages never show up in derived mailboxes.

use std::fmt;

use crate::support::system_config::FixedMailboxConfig;

/// The name of the root virtual mailbox.
pub const ALL_MAILBOX: &str = "All";
/// The name of the virtual mailbox holding flagged messages.
pub const STARRED_MAILBOX: &str = "Starred";

/// The mailbox patterns `All` is built from: everything but the trash.
pub const ALL_PATTERNS: &[&str] = &["*", "-Trash", "-Trash/*"];

/// The text of a rule file.
///
/// Always ends with exactly one newline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleFile(String);

impl RuleFile {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for RuleFile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn rule(scope: &str, search: &str) -> RuleFile {
    RuleFile(format!("{}\n  {}\n", scope, search))
}

/// The rule for the mailbox of messages carrying `keyword`.
pub fn build_keyword_rule(prefix: &str, keyword: &str) -> RuleFile {
    rule(
        &format!("{}{}", prefix, ALL_MAILBOX),
        &format!("KEYWORD {}", keyword),
    )
}

/// A rule evaluating `search` within `All`.
pub fn build_child_rule(prefix: &str, search: &str) -> RuleFile {
    rule(&format!("{}{}", prefix, ALL_MAILBOX), search)
}

/// A rule evaluating `search` over the mailboxes matched by `patterns`, which
/// is newline-separated.
pub fn build_root_rule(patterns: &str, search: &str) -> RuleFile {
    rule(patterns, search)
}

/// Determine whether `data` is a whole rule file rather than a prefix of one.
///
/// Every rule ends with a newline-terminated search line indented by two
/// spaces, and pattern or scope lines never start with whitespace. A write
/// cut short, even at a line boundary, fails this check.
pub fn is_complete_rule(data: &[u8]) -> bool {
    let body = match data.strip_suffix(b"\n") {
        Some(body) => body,
        None => return false,
    };

    let last_line = match body.iter().rposition(|&b| b'\n' == b) {
        Some(nl) => &body[nl + 1..],
        None => return false,
    };

    last_line.starts_with(b"  ")
        && last_line
            .get(2)
            .map_or(false, |&b| !b.is_ascii_whitespace())
}

/// The reason a virtual mailbox should exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Some message carries this keyword.
    Keyword(String),
    /// A mailbox that always exists, named `label`, defined by `criterion`.
    FixedSearch { criterion: String, label: String },
}

impl Trigger {
    fn fixed(label: &str, criterion: &str) -> Self {
        Trigger::FixedSearch {
            criterion: criterion.to_owned(),
            label: label.to_owned(),
        }
    }

    /// The name of the mailbox, without namespace prefix.
    pub fn mailbox_name(&self) -> &str {
        match *self {
            Trigger::Keyword(ref keyword) => keyword,
            Trigger::FixedSearch { ref label, .. } => label,
        }
    }

    /// Build the rule file for this trigger's mailbox in the namespace with
    /// the given prefix.
    pub fn rule(&self, prefix: &str) -> RuleFile {
        match *self {
            Trigger::Keyword(ref keyword) => {
                build_keyword_rule(prefix, keyword)
            }
            Trigger::FixedSearch {
                ref criterion,
                ref label,
            } if label == ALL_MAILBOX => {
                build_root_rule(&ALL_PATTERNS.join("\n"), criterion)
            }
            Trigger::FixedSearch { ref criterion, .. } => {
                build_child_rule(prefix, criterion)
            }
        }
    }
}

/// The mailboxes provisioned when a user's namespaces are created, in order.
///
/// `All` always comes first since every other rule is scoped within it.
/// Extras whose names collide with `All` or `Starred` are dropped.
pub fn fixed_triggers(extra: &[FixedMailboxConfig]) -> Vec<Trigger> {
    let mut triggers = vec![
        Trigger::fixed(ALL_MAILBOX, "ALL"),
        Trigger::fixed(STARRED_MAILBOX, "FLAGGED"),
    ];

    for mailbox in extra {
        if !triggers.iter().any(|t| t.mailbox_name() == mailbox.name) {
            triggers.push(Trigger::fixed(&mailbox.name, &mailbox.search));
        }
    }

    triggers
}
