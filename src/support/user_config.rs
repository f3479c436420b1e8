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

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::system_config::DEFAULT_PREFIX;

/// The name of the per-user setting that overrides the namespace prefix.
pub const PREFIX_SETTING: &str = "virtual_keywords_prefix";

/// Per-user state, created when the user's session starts.
///
/// The prefix is never empty and does not change for the life of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserConfig {
    prefix: String,
}

impl UserConfig {
    /// Build the configuration from the user's own prefix setting, if any.
    ///
    /// An unset or empty setting yields `default_prefix`, or `Virtual.` if
    /// that is empty too.
    pub fn new(setting: Option<String>, default_prefix: &str) -> Self {
        let prefix = setting.filter(|s| !s.is_empty()).unwrap_or_else(|| {
            if default_prefix.is_empty() {
                DEFAULT_PREFIX.to_owned()
            } else {
                default_prefix.to_owned()
            }
        });

        UserConfig { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

/// The per-user settings file.
///
/// This is the root of the TOML file stored in "user.toml" at the root of the
/// user directory. Only the filesystem host reads it; other hosts supply
/// settings their own way.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UserSettingsFile {
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}
