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

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use super::main::{KeywordsSubcommand, UserSubcommand};
use crate::fs_host::{DetachedMail, FsStorage, FsUser};
use crate::host::{Existence, MailStorage, MailUser, MailboxHandle};
use crate::namespace;
use crate::router::{Event, EventRouter, Session};
use crate::rules::fixed_triggers;
use crate::support::error::Error;
use crate::support::file_ops::IgnoreKinds;
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

fn open_session(
    system_config: &SystemConfig,
    users_root: &Path,
    name: &str,
) -> Session<FsUser> {
    match FsUser::load(users_root, name, &system_config.namespaces) {
        Ok(user) => Session::new(user),
        Err(Error::NxUser) => die!(EX_NOUSER, "No such user: {}", name),
        Err(Error::Toml(e)) => {
            die!(EX_CONFIG, "Bad settings for user {}: {}", name, e)
        }
        Err(e) => die!(EX_IOERR, "Failed to load user {}: {}", name, e),
    }
}

pub(super) fn init(
    system_config: &SystemConfig,
    users_root: &Path,
    cmd: UserSubcommand,
) {
    let mut session = open_session(system_config, users_root, &cmd.user);
    let router = EventRouter::new(&system_config.virtual_keywords, &FsStorage);
    router.dispatch(&mut session, Event::UserCreated);
    router.dispatch(&mut session, Event::NamespacesCreated);
}

pub(super) fn keywords(
    system_config: &SystemConfig,
    users_root: &Path,
    cmd: KeywordsSubcommand,
) {
    let mut session = open_session(system_config, users_root, &cmd.user);
    let router = EventRouter::new(&system_config.virtual_keywords, &FsStorage);
    let mut mail = DetachedMail::new(cmd.keywords);

    router.dispatch(&mut session, Event::UserCreated);
    router.dispatch(
        &mut session,
        Event::KeywordsUpdated {
            mail: &mut mail,
            old_keywords: &[],
        },
    );
}

pub(super) fn status(
    system_config: &SystemConfig,
    users_root: &Path,
    cmd: UserSubcommand,
) {
    let mut session = open_session(system_config, users_root, &cmd.user);
    let router = EventRouter::new(&system_config.virtual_keywords, &FsStorage);
    let prefix = router.user_config(&mut session).prefix().to_owned();

    let namespace =
        match namespace::resolve(session.user().namespaces(), &prefix) {
            Ok(ns) => ns,
            Err(e) => die!(EX_CONFIG, "{}", e),
        };

    // The fixed mailboxes are always shown, whether or not they exist
    let mut names = fixed_triggers(
        &system_config.virtual_keywords.extra_mailboxes,
    )
    .iter()
    .map(|t| t.mailbox_name().to_owned())
    .collect::<Vec<_>>();

    let on_disk = match fs::read_dir(&namespace.location)
        .map(|it| {
            it.filter_map(|r| r.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect::<BTreeSet<_>>()
        })
        .ignore_not_found()
    {
        Ok(on_disk) => on_disk,
        Err(e) => die!(
            EX_IOERR,
            "Failed to read '{}': {}",
            namespace.location.display(),
            e
        ),
    };
    for name in on_disk {
        if !names.contains(&name) {
            names.push(name);
        }
    }

    for name in names {
        let qualified = namespace.qualify(&name);
        let state = match FsStorage
            .open_mailbox(namespace, &qualified)
            .and_then(|mut mb| mb.existence().map_err(Error::from))
        {
            Ok(Existence::Selectable) => "selectable".to_owned(),
            Ok(Existence::Other) => "not selectable".to_owned(),
            Ok(Existence::Absent) => "absent".to_owned(),
            Err(e) => format!("error: {}", e),
        };

        println!("{}\t{}", qualified, state);
    }
}
