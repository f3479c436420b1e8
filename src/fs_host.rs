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

//! A host backed by a plain directory tree.
//!
//! The layout is
//!
//! ```text
//! users/
//!   <user>/
//!     user.toml                   per-user settings
//!     <namespace location>/
//!       <mailbox>/
//!         dovecot-virtual         rule file
//! ```
//!
//! Mailbox directories are named after the mailbox without its namespace
//! prefix, so `Virtual.Work` lives in `virtual/Work` for the default
//! namespace.
//!
//! A mailbox is selectable once its rule file exists and ends with a newline.
//! Every rule file we write does, so a directory whose rule file is missing or
//! was cut short is reported as not selectable and gets rewritten the next time
//! it is provisioned.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use crate::host::{Existence, Mail, MailStorage, MailUser, MailboxHandle};
use crate::namespace::Namespace;
use crate::provision::CONFIG_FILE_NAME;
use crate::rules::is_complete_rule;
use crate::support::{
    error::Error,
    file_ops::{self, IgnoreKinds},
    safe_name::is_safe_mailbox_name,
    system_config::NamespaceConfig,
    user_config::UserSettingsFile,
};

/// Given the root of a user directory, return the path to the user's settings
/// file.
pub fn user_settings_file(root: &Path) -> PathBuf {
    root.join("user.toml")
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FsStorage;

#[derive(Debug)]
pub struct FsMailbox {
    path: PathBuf,
}

impl MailboxHandle for FsMailbox {
    fn existence(&mut self) -> io::Result<Existence> {
        match fs::metadata(&self.path) {
            Err(e) if io::ErrorKind::NotFound == e.kind() => {
                return Ok(Existence::Absent)
            }
            Err(e) => return Err(e),
            Ok(md) if !md.is_dir() => return Ok(Existence::Other),
            Ok(_) => (),
        }

        match fs::read(self.path.join(CONFIG_FILE_NAME)) {
            Ok(ref data) if is_complete_rule(data) => {
                Ok(Existence::Selectable)
            }
            Ok(_) => Ok(Existence::Other),
            Err(e) if io::ErrorKind::NotFound == e.kind() => {
                Ok(Existence::Other)
            }
            Err(e) => Err(e),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl MailStorage for FsStorage {
    type Mailbox = FsMailbox;
    type ConfigWriter = fs::File;

    fn open_mailbox(
        &self,
        namespace: &Namespace,
        name: &str,
    ) -> Result<FsMailbox, Error> {
        let relative = name
            .strip_prefix(namespace.prefix.as_str())
            .filter(|r| is_safe_mailbox_name(r))
            .ok_or(Error::UnsafeName)?;

        Ok(FsMailbox {
            path: namespace.location.join(relative),
        })
    }

    fn create_mailbox_dir(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::DirBuilder::new()
                .recursive(true)
                .mode(0o750)
                .create(parent)?;
        }

        match fs::DirBuilder::new().mode(0o700).create(path) {
            Err(e)
                if io::ErrorKind::AlreadyExists == e.kind() && path.is_dir() =>
            {
                Ok(())
            }
            r => r,
        }
    }

    fn open_truncate(&self, path: &Path, mode: u32) -> io::Result<fs::File> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)?;
        // The mode only applies to new files
        file_ops::chmod(path, mode)?;
        Ok(file)
    }
}

/// A user whose directory lives under the users root.
#[derive(Clone, Debug)]
pub struct FsUser {
    name: String,
    settings: BTreeMap<String, String>,
    namespaces: Vec<Namespace>,
}

impl FsUser {
    /// Load the user `name` from `users_root`.
    ///
    /// Namespace locations are resolved relative to the user directory.
    pub fn load(
        users_root: &Path,
        name: &str,
        namespaces: &[NamespaceConfig],
    ) -> Result<Self, Error> {
        if !is_safe_mailbox_name(name) {
            return Err(Error::NxUser);
        }

        let root = users_root.join(name);
        if !root.is_dir() {
            return Err(Error::NxUser);
        }

        let settings_toml = fs::read_to_string(user_settings_file(&root))
            .ignore_not_found()?;
        let settings: UserSettingsFile = toml::from_str(&settings_toml)?;

        Ok(FsUser {
            name: name.to_owned(),
            settings: settings.settings,
            namespaces: namespaces
                .iter()
                .map(|ns| {
                    Namespace::new(ns.prefix.clone(), root.join(&ns.location))
                })
                .collect(),
        })
    }
}

impl MailUser for FsUser {
    fn username(&self) -> &str {
        &self.name
    }

    fn setting(&self, key: &str) -> Option<String> {
        self.settings.get(key).cloned()
    }

    fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }
}

/// A message known only by its keywords.
///
/// This is what the command line tool hands to the router; it is its own
/// backend message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetachedMail {
    keywords: Vec<String>,
}

impl DetachedMail {
    pub fn new(keywords: Vec<String>) -> Self {
        DetachedMail { keywords }
    }
}

impl Mail for DetachedMail {
    fn keywords(&self) -> Result<Vec<String>, Error> {
        Ok(self.keywords.clone())
    }

    fn add_keyword(&mut self, keyword: &str) -> Result<(), Error> {
        if !self.keywords.iter().any(|k| k == keyword) {
            self.keywords.push(keyword.to_owned());
        }
        Ok(())
    }

    fn backend_mail(&mut self) -> Option<&mut dyn Mail> {
        Some(self)
    }
}
