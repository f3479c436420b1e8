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

//! The `virtual-keywords` command line tool.
//!
//! It drives the filesystem host by hand: each subcommand replays the events a
//! mail server would deliver for one user.

macro_rules! die {
    ($ex:expr, $($stuff:tt)*) => {{
        eprintln!($($stuff)*);
        $ex.exit()
    }};
}

mod commands;
pub mod main;
