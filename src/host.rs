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

//! The interface to the mail system virtual mailboxes are created in.
//!
//! The host delivers events and owns the actual storage. Everything here is
//! implemented by the host; `fs_host` is the implementation for a plain
//! directory tree.

use std::io::{self, Write};
use std::path::Path;

use crate::namespace::Namespace;
use crate::support::error::Error;

/// Whether a mailbox exists, and if so whether it is usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Existence {
    /// There is no such mailbox.
    Absent,
    /// The mailbox exists and can be selected.
    Selectable,
    /// Something exists under the name, but it cannot be selected, e.g. a
    /// `\Noselect` mailbox or a partially created one.
    Other,
}

/// A read-only reference to a single mailbox.
///
/// Dropping the handle releases whatever the host allocated for it.
pub trait MailboxHandle {
    fn existence(&mut self) -> io::Result<Existence>;
    /// The directory the mailbox's data lives in, whether or not it exists
    /// yet.
    fn path(&self) -> &Path;
}

/// The storage primitives provisioning needs.
pub trait MailStorage {
    type Mailbox: MailboxHandle;
    type ConfigWriter: Write;

    /// Allocate a handle to the mailbox with the fully-qualified `name` in
    /// `namespace`.
    fn open_mailbox(
        &self,
        namespace: &Namespace,
        name: &str,
    ) -> Result<Self::Mailbox, Error>;

    /// Create the directory at `path`.
    ///
    /// Succeeds if the directory already exists.
    fn create_mailbox_dir(&self, path: &Path) -> io::Result<()>;

    /// Open the file at `path` for writing, creating it with `mode` if needed
    /// and truncating it otherwise.
    fn open_truncate(
        &self,
        path: &Path,
        mode: u32,
    ) -> io::Result<Self::ConfigWriter>;
}

/// The user a session belongs to.
pub trait MailUser {
    fn username(&self) -> &str;
    /// Look up a per-user setting.
    fn setting(&self, key: &str) -> Option<String>;
    /// The user's namespaces, in the order the host resolves them.
    fn namespaces(&self) -> &[Namespace];
}

/// A single message.
pub trait Mail {
    /// The keywords the message currently carries.
    fn keywords(&self) -> Result<Vec<String>, Error>;
    fn add_keyword(&mut self, keyword: &str) -> Result<(), Error>;
    /// The real message behind this one.
    ///
    /// A message seen through a virtual mailbox is only a view; changes need
    /// to be made to the backend message instead. Messages not in a virtual
    /// mailbox return themselves. `None` if the backend message cannot be
    /// found.
    fn backend_mail(&mut self) -> Option<&mut dyn Mail>;
}
