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

//! Miscellaneous functions for working with files.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

pub fn chmod(path: impl AsRef<Path>, mode: u32) -> io::Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

pub trait WriteUninterruptibly: Write {
    fn write_uninterruptibly(&mut self, src: &[u8]) -> io::Result<usize>;
}

impl<W: Write + ?Sized> WriteUninterruptibly for W {
    /// Write bytes from `src` until all of it has been accepted or the writer
    /// stops accepting data.
    ///
    /// Unlike `write_all()`, a writer that returns `Ok(0)` is not an error;
    /// the caller gets the number of bytes actually written and decides what
    /// a short write means. `Interrupted` errors are ignored and retried.
    /// Other errors are propagated.
    fn write_uninterruptibly(&mut self, mut src: &[u8]) -> io::Result<usize> {
        let mut total = 0;
        while !src.is_empty() {
            match self.write(src) {
                Ok(0) => break,
                Ok(n) => {
                    total += n;
                    src = &src[n..];
                }
                Err(e) if io::ErrorKind::Interrupted == e.kind() => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(total)
    }
}

pub trait IgnoreKinds {
    fn ignore_not_found(self) -> Self;
}

impl<R: Default> IgnoreKinds for Result<R, io::Error> {
    /// Treat a `NotFound` error as success with the default value.
    fn ignore_not_found(self) -> Self {
        match self {
            Err(e) if io::ErrorKind::NotFound == e.kind() => Ok(R::default()),
            r => r,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Accepts at most `limit` bytes, then reports end of stream.
    struct Stingy {
        data: Vec<u8>,
        limit: usize,
        interrupt_once: bool,
    }

    impl Write for Stingy {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if std::mem::take(&mut self.interrupt_once) {
                return Err(io::ErrorKind::Interrupted.into());
            }

            let n = buf.len().min(3).min(self.limit - self.data.len());
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_uninterruptibly_retries_and_reports_short_writes() {
        let mut w = Stingy {
            data: Vec::new(),
            limit: 100,
            interrupt_once: true,
        };
        assert_eq!(11, w.write_uninterruptibly(b"hello world").unwrap());
        assert_eq!(b"hello world", &w.data[..]);

        let mut w = Stingy {
            data: Vec::new(),
            limit: 5,
            interrupt_once: false,
        };
        assert_eq!(5, w.write_uninterruptibly(b"hello world").unwrap());
        assert_eq!(b"hello", &w.data[..]);
    }

    #[test]
    fn not_found_becomes_default() {
        let nx: io::Result<String> = Err(io::ErrorKind::NotFound.into());
        assert_eq!("", nx.ignore_not_found().unwrap());

        let denied: io::Result<String> =
            Err(io::ErrorKind::PermissionDenied.into());
        assert!(denied.ignore_not_found().is_err());
    }
}
