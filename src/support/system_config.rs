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

use serde::{Deserialize, Serialize};

use super::error::Error;

/// The prefix used for the virtual namespace when nothing else is configured.
pub const DEFAULT_PREFIX: &str = "Virtual.";

/// The system-wide configuration.
///
/// This is stored in a file named `virtual-keywords.toml` under the system
/// root, which is typically `/usr/local/etc/virtual-keywords` or
/// `/etc/virtual-keywords`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SystemConfig {
    /// Options controlling which virtual mailboxes are created.
    #[serde(default)]
    pub virtual_keywords: VirtualKeywordsConfig,

    /// The namespaces available to every user.
    ///
    /// If not given, a single namespace with the default prefix, stored in
    /// `virtual` under the user directory, is assumed.
    #[serde(default = "default_namespaces", rename = "namespace")]
    pub namespaces: Vec<NamespaceConfig>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        SystemConfig {
            virtual_keywords: VirtualKeywordsConfig::default(),
            namespaces: default_namespaces(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct VirtualKeywordsConfig {
    /// The prefix of the namespace virtual mailboxes are created in, for users
    /// who do not override it with the `virtual_keywords_prefix` setting.
    pub default_prefix: String,

    /// If set, messages copied anywhere get this keyword added to the real
    /// underlying message, and the matching virtual mailbox is provisioned.
    ///
    /// When unset, copies are ignored entirely.
    pub copy_keyword: Option<String>,

    /// Keywords which never get a virtual mailbox of their own.
    ///
    /// Useful for housekeeping keywords like `$Forwarded` or `NonJunk` that
    /// clients set on nearly everything.
    pub ignored_keywords: Vec<String>,

    /// Additional fixed virtual mailboxes, created after `All` and `Starred`.
    #[serde(rename = "extra_mailbox")]
    pub extra_mailboxes: Vec<FixedMailboxConfig>,
}

impl Default for VirtualKeywordsConfig {
    fn default() -> Self {
        VirtualKeywordsConfig {
            default_prefix: DEFAULT_PREFIX.to_owned(),
            copy_keyword: None,
            ignored_keywords: vec![],
            extra_mailboxes: vec![],
        }
    }
}

impl VirtualKeywordsConfig {
    /// Check the constraints serde cannot express.
    pub fn validate(&self) -> Result<(), Error> {
        if self.default_prefix.is_empty() {
            return Err(Error::EmptyDefaultPrefix);
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct FixedMailboxConfig {
    /// The name of the mailbox, without the namespace prefix.
    pub name: String,
    /// The search expression, e.g. `UNSEEN`, evaluated within `All`.
    pub search: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NamespaceConfig {
    pub prefix: String,
    /// Where the namespace's mailboxes live, relative to the user directory.
    pub location: PathBuf,
}

fn default_namespaces() -> Vec<NamespaceConfig> {
    vec![NamespaceConfig {
        prefix: DEFAULT_PREFIX.to_owned(),
        location: "virtual".into(),
    }]
}
