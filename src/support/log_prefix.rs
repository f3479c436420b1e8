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

use std::fmt;

/// Text included at the start of every log statement made on behalf of a
/// session, e.g. `virtual-keywords[alice]`.
#[derive(Clone, Debug)]
pub struct LogPrefix {
    component: &'static str,
    user: Option<String>,
}

impl LogPrefix {
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            user: None,
        }
    }

    pub fn set_user(&mut self, user: &str) {
        self.user = Some(sanitise(user));
    }
}

impl fmt::Display for LogPrefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.component)?;
        if let Some(ref user) = self.user {
            write!(f, "[{}]", user)?;
        }

        Ok(())
    }
}

fn sanitise(s: &str) -> String {
    s.chars().filter(|c| !c.is_control()).take(64).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        let mut prefix = LogPrefix::new("virtual-keywords");
        assert_eq!("virtual-keywords", prefix.to_string());

        prefix.set_user("alice\r\n");
        assert_eq!("virtual-keywords[alice]", prefix.to_string());

        prefix.set_user(&"x".repeat(100));
        assert_eq!(
            format!("virtual-keywords[{}]", "x".repeat(64)),
            prefix.to_string()
        );
    }
}
