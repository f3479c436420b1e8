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

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsafe mailbox name")]
    UnsafeName,
    #[error("No namespace with prefix {0:?}")]
    NamespaceNotFound(String),
    #[error("No such user")]
    NxUser,
    #[error("The default virtual namespace prefix is empty")]
    EmptyDefaultPrefix,
    #[error("Failed to check existence of {mailbox:?}: {source}")]
    ExistenceCheckFailed {
        mailbox: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to create mailbox directory {}: {source}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to open {}: {source}", path.display())]
    ConfigOpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    ConfigWriteFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "Short write to {}: {written} of {expected} bytes",
        path.display()
    )]
    ConfigWriteShort {
        path: PathBuf,
        written: usize,
        expected: usize,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
