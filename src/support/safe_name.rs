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

/// Longest name we are willing to turn into a directory.
const MAX_NAME_LEN: usize = 255;

/// Determine whether `name` may be used as the name of a virtual mailbox.
///
/// Keyword names come straight from whatever clients chose to store on
/// messages, so they end up as directory names only after passing this check.
/// It excludes empty names, anything that could traverse directories or create
/// hidden files, and characters with special meaning in IMAP mailbox names or
/// LIST patterns.
///
/// Whether the name is ultimately a valid file name is left to the OS.
pub fn is_safe_mailbox_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name.starts_with('.')
        && !name.starts_with('#')
        // Nothing special to the file system or to LIST patterns
        && !name.contains(|c: char| {
            matches!(c, '/' | '\\' | '*' | '%' | '\x7F') || c < ' '
        })
}
