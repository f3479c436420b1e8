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

use std::path::PathBuf;

use crate::support::error::Error;

/// A storage scope whose mailbox names all start with `prefix`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: String,
    /// Where the host keeps the namespace's mailboxes. Only the host
    /// interprets this.
    pub location: PathBuf,
}

impl Namespace {
    pub fn new(
        prefix: impl Into<String>,
        location: impl Into<PathBuf>,
    ) -> Self {
        Namespace {
            prefix: prefix.into(),
            location: location.into(),
        }
    }

    /// Return the fully-qualified name of `mailbox` within this namespace.
    pub fn qualify(&self, mailbox: &str) -> String {
        format!("{}{}", self.prefix, mailbox)
    }
}

/// Find the namespace whose prefix is exactly `prefix`.
///
/// If several match, the first in `namespaces` wins. A missing namespace is a
/// configuration problem, so callers should report it rather than retry.
pub fn resolve<'a>(
    namespaces: &'a [Namespace],
    prefix: &str,
) -> Result<&'a Namespace, Error> {
    namespaces
        .iter()
        .find(|ns| ns.prefix == prefix)
        .ok_or_else(|| Error::NamespaceNotFound(prefix.to_owned()))
}
