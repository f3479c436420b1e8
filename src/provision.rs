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

//! Creation of virtual mailboxes.
//!
//! A virtual mailbox is a directory holding a single rule file. It is created
//! at most once: as soon as the host reports it selectable, provisioning it
//! again does nothing, even if the rule would now be different.
//!
//! Nothing here is transactional. If the directory gets created but the rule
//! file cannot be written, the directory stays; the mailbox is then not
//! selectable, so the next provisioning attempt writes the rule file again.

use std::io::Write;

use log::{info, warn};

use crate::host::{Existence, MailStorage, MailboxHandle};
use crate::namespace::Namespace;
use crate::rules::RuleFile;
use crate::support::{
    error::Error, file_ops::WriteUninterruptibly, log_prefix::LogPrefix,
};

/// The name of the rule file within a virtual mailbox's directory.
pub const CONFIG_FILE_NAME: &str = "dovecot-virtual";
/// Permissions for new rule files.
pub const CONFIG_FILE_MODE: u32 = 0o600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provisioned {
    /// The mailbox was already selectable; nothing was written.
    AlreadyPresent,
    /// The mailbox directory and rule file were written.
    Created,
}

pub struct Provisioner<'a, S> {
    storage: &'a S,
    log_prefix: &'a LogPrefix,
}

impl<'a, S: MailStorage> Provisioner<'a, S> {
    pub fn new(storage: &'a S, log_prefix: &'a LogPrefix) -> Self {
        Provisioner {
            storage,
            log_prefix,
        }
    }

    /// Ensure that `mailbox_name` exists in `namespace` with `rule` as its
    /// rule file.
    ///
    /// The mailbox handle is released before returning, whatever the outcome.
    /// On error, the directory may have been created without a complete rule
    /// file.
    pub fn provision(
        &self,
        namespace: &Namespace,
        mailbox_name: &str,
        rule: &RuleFile,
    ) -> Result<Provisioned, Error> {
        let name = namespace.qualify(mailbox_name);
        let mut mailbox = self.storage.open_mailbox(namespace, &name)?;

        match mailbox.existence().map_err(|source| {
            Error::ExistenceCheckFailed {
                mailbox: name.clone(),
                source,
            }
        })? {
            Existence::Selectable => return Ok(Provisioned::AlreadyPresent),
            Existence::Absent => (),
            Existence::Other => warn!(
                "{} {} exists but is not selectable; rewriting its rules",
                self.log_prefix, name
            ),
        }

        let path = mailbox.path().to_owned();
        self.storage.create_mailbox_dir(&path).map_err(|source| {
            Error::DirectoryCreateFailed {
                path: path.clone(),
                source,
            }
        })?;

        let config_path = path.join(CONFIG_FILE_NAME);
        let mut writer = self
            .storage
            .open_truncate(&config_path, CONFIG_FILE_MODE)
            .map_err(|source| Error::ConfigOpenFailed {
                path: config_path.clone(),
                source,
            })?;

        let data = rule.as_bytes();
        let written = writer
            .write_uninterruptibly(data)
            .and_then(|n| writer.flush().map(|()| n))
            .map_err(|source| Error::ConfigWriteFailed {
                path: config_path.clone(),
                source,
            })?;
        if written < data.len() {
            return Err(Error::ConfigWriteShort {
                path: config_path,
                written,
                expected: data.len(),
            });
        }

        info!("{} Created virtual mailbox {}", self.log_prefix, name);
        Ok(Provisioned::Created)
    }
}
