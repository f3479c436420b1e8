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

//! Dispatch of host events to provisioning.
//!
//! No handler fails from the host's point of view: whatever goes wrong is
//! logged, and the operation that caused the event carries on regardless.

use std::collections::HashSet;

use log::{debug, error, warn};

use crate::host::{Mail, MailStorage, MailUser};
use crate::namespace;
use crate::provision::{Provisioned, Provisioner};
use crate::rules::{fixed_triggers, Trigger};
use crate::support::{
    error::Error,
    log_prefix::LogPrefix,
    safe_name::is_safe_mailbox_name,
    system_config::VirtualKeywordsConfig,
    user_config::{UserConfig, PREFIX_SETTING},
};

/// An event delivered by the host.
pub enum Event<'a> {
    /// The user's session has started.
    UserCreated,
    /// The user's namespaces have been set up.
    NamespacesCreated,
    /// The keywords on `mail` changed; `old_keywords` is what it had before.
    KeywordsUpdated {
        mail: &'a mut dyn Mail,
        old_keywords: &'a [String],
    },
    /// `source` was copied, producing `destination`.
    MailCopied {
        source: &'a dyn Mail,
        destination: &'a mut dyn Mail,
    },
}

/// The state kept for one user for the duration of their session.
pub struct Session<U> {
    user: U,
    config: Option<UserConfig>,
    log_prefix: LogPrefix,
}

impl<U: MailUser> Session<U> {
    pub fn new(user: U) -> Self {
        let mut log_prefix = LogPrefix::new("virtual-keywords");
        log_prefix.set_user(user.username());
        Session {
            user,
            config: None,
            log_prefix,
        }
    }

    pub fn user(&self) -> &U {
        &self.user
    }

    /// The user's configuration, once `UserCreated` has been handled.
    pub fn config(&self) -> Option<&UserConfig> {
        self.config.as_ref()
    }

    pub fn log_prefix(&self) -> &LogPrefix {
        &self.log_prefix
    }
}

pub struct EventRouter<'a, S> {
    config: &'a VirtualKeywordsConfig,
    storage: &'a S,
    fixed: Vec<Trigger>,
}

impl<'a, S: MailStorage> EventRouter<'a, S> {
    pub fn new(config: &'a VirtualKeywordsConfig, storage: &'a S) -> Self {
        EventRouter {
            config,
            storage,
            fixed: fixed_triggers(&config.extra_mailboxes),
        }
    }

    pub fn dispatch<U: MailUser>(
        &self,
        session: &mut Session<U>,
        event: Event<'_>,
    ) {
        match event {
            Event::UserCreated => self.on_user_created(session),
            Event::NamespacesCreated => self.on_namespaces_created(session),
            Event::KeywordsUpdated { mail, old_keywords } => {
                self.on_keywords_updated(session, mail, old_keywords)
            }
            Event::MailCopied {
                source,
                destination,
            } => self.on_mail_copied(session, source, destination),
        }
    }

    /// Attach the user's configuration to the session, if not already done.
    pub fn on_user_created<U: MailUser>(&self, session: &mut Session<U>) {
        self.user_config(session);
    }

    /// Provision the fixed mailboxes, `All` first.
    ///
    /// Each is attempted even if an earlier one failed.
    pub fn on_namespaces_created<U: MailUser>(
        &self,
        session: &mut Session<U>,
    ) {
        let prefix = self.user_config(session).prefix().to_owned();
        for trigger in &self.fixed {
            self.provision_logged(session, &prefix, trigger);
        }
    }

    /// Provision a mailbox for every keyword `mail` now has.
    ///
    /// `_old_keywords` is not consulted; mailboxes of keywords that went away
    /// are left in place.
    pub fn on_keywords_updated<U: MailUser>(
        &self,
        session: &mut Session<U>,
        mail: &mut dyn Mail,
        _old_keywords: &[String],
    ) {
        let prefix = self.user_config(session).prefix().to_owned();
        let keywords = match mail.keywords() {
            Ok(keywords) => keywords,
            Err(e) => {
                error!(
                    "{} Failed to read keywords of updated message: {}",
                    session.log_prefix, e
                );
                return;
            }
        };

        let mut seen = HashSet::new();
        for keyword in keywords {
            if seen.insert(keyword.clone()) {
                self.provision_keyword(session, &prefix, keyword);
            }
        }
    }

    /// Tag the real message behind `destination` with the configured copy
    /// keyword and provision that keyword's mailbox.
    ///
    /// Does nothing unless `copy_keyword` is configured.
    pub fn on_mail_copied<U: MailUser>(
        &self,
        session: &mut Session<U>,
        _source: &dyn Mail,
        destination: &mut dyn Mail,
    ) {
        let keyword = match self.config.copy_keyword {
            Some(ref keyword) => keyword,
            None => return,
        };

        let prefix = self.user_config(session).prefix().to_owned();
        let backend = match destination.backend_mail() {
            Some(backend) => backend,
            None => {
                debug!(
                    "{} No backend message for copy; not adding {}",
                    session.log_prefix, keyword
                );
                return;
            }
        };

        if let Err(e) = backend.add_keyword(keyword) {
            error!(
                "{} Failed to add {} to copied message: {}",
                session.log_prefix, keyword, e
            );
            return;
        }

        self.provision_keyword(session, &prefix, keyword.clone());
    }

    /// Return the session's configuration, creating it if this is the first
    /// event of the session.
    pub fn user_config<'s, U: MailUser>(
        &self,
        session: &'s mut Session<U>,
    ) -> &'s UserConfig {
        let config = match session.config.take() {
            Some(config) => config,
            None => {
                let setting = session.user.setting(PREFIX_SETTING);
                if Some("") == setting.as_deref() {
                    warn!(
                        "{} {} is empty; using {:?}",
                        session.log_prefix,
                        PREFIX_SETTING,
                        self.config.default_prefix
                    );
                }

                let config =
                    UserConfig::new(setting, &self.config.default_prefix);
                debug!(
                    "{} Virtual namespace prefix is {:?}",
                    session.log_prefix,
                    config.prefix()
                );
                config
            }
        };

        session.config.get_or_insert(config)
    }

    fn provision_keyword<U: MailUser>(
        &self,
        session: &Session<U>,
        prefix: &str,
        keyword: String,
    ) {
        if !is_safe_mailbox_name(&keyword) {
            warn!(
                "{} Keyword {:?} cannot be a mailbox name; skipping",
                session.log_prefix, keyword
            );
            return;
        }

        if self.config.ignored_keywords.contains(&keyword) {
            debug!("{} Ignoring keyword {}", session.log_prefix, keyword);
            return;
        }

        if self.fixed.iter().any(|t| t.mailbox_name() == keyword) {
            warn!(
                "{} Keyword {} has the name of a fixed mailbox; skipping",
                session.log_prefix, keyword
            );
            return;
        }

        self.provision_logged(session, prefix, &Trigger::Keyword(keyword));
    }

    fn provision_logged<U: MailUser>(
        &self,
        session: &Session<U>,
        prefix: &str,
        trigger: &Trigger,
    ) {
        match self.provision(session, prefix, trigger) {
            Ok(Provisioned::Created) => (),
            Ok(Provisioned::AlreadyPresent) => debug!(
                "{} {}{} already exists",
                session.log_prefix,
                prefix,
                trigger.mailbox_name()
            ),
            Err(e) => error!(
                "{} Failed to provision virtual mailbox {}{}: {}",
                session.log_prefix,
                prefix,
                trigger.mailbox_name(),
                e
            ),
        }
    }

    fn provision<U: MailUser>(
        &self,
        session: &Session<U>,
        prefix: &str,
        trigger: &Trigger,
    ) -> Result<Provisioned, Error> {
        let namespace = namespace::resolve(session.user.namespaces(), prefix)?;
        Provisioner::new(self.storage, &session.log_prefix).provision(
            namespace,
            trigger.mailbox_name(),
            &trigger.rule(prefix),
        )
    }
}

#[cfg(test)]
mod test {
    use std::fs;
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use super::*;
    use crate::fs_host::{DetachedMail, FsStorage};
    use crate::namespace::Namespace;
    use crate::provision::test::{FailAt, MockStorage};
    use crate::provision::CONFIG_FILE_NAME;
    use crate::support::system_config::FixedMailboxConfig;

    struct TestUser {
        settings: Vec<(String, String)>,
        namespaces: Vec<Namespace>,
    }

    impl MailUser for TestUser {
        fn username(&self) -> &str {
            "tester"
        }

        fn setting(&self, key: &str) -> Option<String> {
            self.settings
                .iter()
                .find(|&&(ref k, _)| k == key)
                .map(|&(_, ref v)| v.clone())
        }

        fn namespaces(&self) -> &[Namespace] {
            &self.namespaces
        }
    }

    /// A message seen through a virtual mailbox whose backend message is
    /// gone.
    struct OrphanMail;

    impl Mail for OrphanMail {
        fn keywords(&self) -> Result<Vec<String>, Error> {
            Ok(vec![])
        }

        fn add_keyword(&mut self, _: &str) -> Result<(), Error> {
            panic!("Keyword added to orphan")
        }

        fn backend_mail(&mut self) -> Option<&mut dyn Mail> {
            None
        }
    }

    struct Setup {
        root: TempDir,
        session: Session<TestUser>,
    }

    impl Setup {
        fn virtual_root(&self) -> PathBuf {
            self.root.path().join("virtual")
        }

        fn rule(&self, mailbox: &str) -> Option<String> {
            fs::read_to_string(
                self.virtual_root().join(mailbox).join(CONFIG_FILE_NAME),
            )
            .ok()
        }

        fn mailboxes(&self) -> Vec<String> {
            let mut names = fs::read_dir(self.virtual_root())
                .map(|it| {
                    it.map(|e| e.unwrap().file_name().into_string().unwrap())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            names.sort();
            names
        }
    }

    fn set_up_with(prefix_setting: Option<&str>, ns_prefix: &str) -> Setup {
        crate::init_test_log();

        let root = TempDir::new().unwrap();
        let user = TestUser {
            settings: prefix_setting
                .map(|p| (PREFIX_SETTING.to_owned(), p.to_owned()))
                .into_iter()
                .collect(),
            namespaces: vec![
                Namespace::new("", root.path().join("mail")),
                Namespace::new(ns_prefix, root.path().join("virtual")),
            ],
        };

        Setup {
            root,
            session: Session::new(user),
        }
    }

    fn set_up() -> Setup {
        set_up_with(None, "Virtual.")
    }

    #[test]
    fn user_created_uses_default_prefix() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up();
        assert!(setup.session.config().is_none());

        EventRouter::new(&config, &FsStorage)
            .dispatch(&mut setup.session, Event::UserCreated);
        assert_eq!("Virtual.", setup.session.config().unwrap().prefix());
    }

    #[test]
    fn user_created_honours_setting_once() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up_with(Some("Tags."), "Tags.");
        let router = EventRouter::new(&config, &FsStorage);

        router.on_user_created(&mut setup.session);
        assert_eq!("Tags.", setup.session.config().unwrap().prefix());

        setup.session.user.settings.clear();
        router.on_user_created(&mut setup.session);
        assert_eq!("Tags.", setup.session.config().unwrap().prefix());
    }

    #[test]
    fn empty_setting_falls_back_to_default() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up_with(Some(""), "Virtual.");
        EventRouter::new(&config, &FsStorage)
            .on_user_created(&mut setup.session);
        assert_eq!("Virtual.", setup.session.config().unwrap().prefix());
    }

    #[test]
    fn empty_default_prefix_never_reaches_session() {
        let config = VirtualKeywordsConfig {
            default_prefix: String::new(),
            ..VirtualKeywordsConfig::default()
        };
        let mut setup = set_up();
        let prefix = EventRouter::new(&config, &FsStorage)
            .user_config(&mut setup.session)
            .prefix()
            .to_owned();
        assert_eq!("Virtual.", prefix);
    }

    #[test]
    fn namespaces_created_provisions_all_and_starred() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up();
        let router = EventRouter::new(&config, &FsStorage);

        router.dispatch(&mut setup.session, Event::UserCreated);
        router.dispatch(&mut setup.session, Event::NamespacesCreated);

        assert_eq!(vec!["All", "Starred"], setup.mailboxes());
        assert_eq!(
            Some("*\n-Trash\n-Trash/*\n  ALL\n".to_owned()),
            setup.rule("All")
        );
        assert_eq!(
            Some("Virtual.All\n  FLAGGED\n".to_owned()),
            setup.rule("Starred")
        );

        // Nothing touched outside the virtual namespace
        assert!(!setup.root.path().join("mail").exists());

        // Again is harmless
        router.dispatch(&mut setup.session, Event::NamespacesCreated);
        assert_eq!(vec!["All", "Starred"], setup.mailboxes());
    }

    #[test]
    fn namespaces_created_includes_extras() {
        let config = VirtualKeywordsConfig {
            extra_mailboxes: vec![FixedMailboxConfig {
                name: "Unread".to_owned(),
                search: "UNSEEN".to_owned(),
            }],
            ..VirtualKeywordsConfig::default()
        };
        let mut setup = set_up();
        EventRouter::new(&config, &FsStorage)
            .on_namespaces_created(&mut setup.session);

        assert_eq!(vec!["All", "Starred", "Unread"], setup.mailboxes());
        assert_eq!(
            Some("Virtual.All\n  UNSEEN\n".to_owned()),
            setup.rule("Unread")
        );
    }

    #[test]
    fn missing_namespace_provisions_nothing() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up_with(Some("Foo."), "Virtual.");
        let router = EventRouter::new(&config, &FsStorage);

        router.dispatch(&mut setup.session, Event::UserCreated);
        router.dispatch(&mut setup.session, Event::NamespacesCreated);
        assert!(setup.mailboxes().is_empty());

        let mut mail = DetachedMail::new(vec!["Work".to_owned()]);
        router.dispatch(
            &mut setup.session,
            Event::KeywordsUpdated {
                mail: &mut mail,
                old_keywords: &[],
            },
        );
        assert!(setup.mailboxes().is_empty());
    }

    #[test]
    fn missing_namespace_never_opens_a_mailbox() {
        let config = VirtualKeywordsConfig::default();
        let storage = MockStorage::default();
        let mut session = Session::new(TestUser {
            settings: vec![],
            namespaces: vec![Namespace::new("Foo.", "/foo")],
        });

        EventRouter::new(&config, &storage)
            .on_namespaces_created(&mut session);
        assert_eq!(0, storage.state.borrow().opened);
    }

    #[test]
    fn namespaces_created_provisions_all_first() {
        let config = VirtualKeywordsConfig::default();
        let storage = MockStorage::default();
        let mut session = Session::new(TestUser {
            settings: vec![],
            namespaces: vec![Namespace::new("Virtual.", "/v")],
        });

        EventRouter::new(&config, &storage)
            .on_namespaces_created(&mut session);
        assert_eq!(
            vec!["Virtual.All", "Virtual.Starred"],
            storage.state.borrow().opened_names
        );
    }

    #[test]
    fn fixed_mailbox_failures_are_independent() {
        let config = VirtualKeywordsConfig::default();
        let storage = MockStorage::failing_at(FailAt::Write);
        let mut session = Session::new(TestUser {
            settings: vec![],
            namespaces: vec![Namespace::new("Virtual.", "/v")],
        });

        EventRouter::new(&config, &storage)
            .on_namespaces_created(&mut session);

        let state = storage.state.borrow();
        assert_eq!(2, state.opened);
        assert_eq!(2, state.released);
        assert_eq!(2, state.config_opens);
    }

    #[test]
    fn keywords_updated_provisions_current_keywords() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up();
        let router = EventRouter::new(&config, &FsStorage);
        router.dispatch(&mut setup.session, Event::UserCreated);

        let mut mail = DetachedMail::new(vec![
            "Work".to_owned(),
            "Urgent".to_owned(),
            "Work".to_owned(),
        ]);
        let old = vec!["Stale".to_owned()];
        router.dispatch(
            &mut setup.session,
            Event::KeywordsUpdated {
                mail: &mut mail,
                old_keywords: &old,
            },
        );

        assert_eq!(vec!["Urgent", "Work"], setup.mailboxes());
        assert_eq!(
            Some("Virtual.All\n  KEYWORD Work\n".to_owned()),
            setup.rule("Work")
        );
        assert_eq!(
            Some("Virtual.All\n  KEYWORD Urgent\n".to_owned()),
            setup.rule("Urgent")
        );
    }

    #[test]
    fn keywords_updated_never_rewrites_rules() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up();
        let router = EventRouter::new(&config, &FsStorage);

        let mut mail = DetachedMail::new(vec!["Work".to_owned()]);
        router.on_keywords_updated(&mut setup.session, &mut mail, &[]);

        let rule_path =
            setup.virtual_root().join("Work").join(CONFIG_FILE_NAME);
        fs::write(&rule_path, "Virtual.All\n  KEYWORD Work UNSEEN\n")
            .unwrap();
        router.on_keywords_updated(&mut setup.session, &mut mail, &[]);
        assert_eq!(
            Some("Virtual.All\n  KEYWORD Work UNSEEN\n".to_owned()),
            setup.rule("Work")
        );
    }

    #[test]
    fn namespaces_created_repairs_rule_cut_at_line_boundary() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up();
        let router = EventRouter::new(&config, &FsStorage);

        let dir = setup.virtual_root().join("All");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILE_NAME), "*\n").unwrap();

        router.on_namespaces_created(&mut setup.session);
        assert_eq!(
            Some("*\n-Trash\n-Trash/*\n  ALL\n".to_owned()),
            setup.rule("All")
        );
    }

    #[test]
    fn keywords_updated_repairs_truncated_rules() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up();
        let router = EventRouter::new(&config, &FsStorage);

        let dir = setup.virtual_root().join("Work");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(CONFIG_FILE_NAME), "Virtual.All\n  KEYW").unwrap();

        let mut mail = DetachedMail::new(vec!["Work".to_owned()]);
        router.on_keywords_updated(&mut setup.session, &mut mail, &[]);
        assert_eq!(
            Some("Virtual.All\n  KEYWORD Work\n".to_owned()),
            setup.rule("Work")
        );
    }

    #[test]
    fn keywords_updated_skips_unwanted_keywords() {
        let config = VirtualKeywordsConfig {
            ignored_keywords: vec!["$Forwarded".to_owned()],
            ..VirtualKeywordsConfig::default()
        };
        let mut setup = set_up();
        let router = EventRouter::new(&config, &FsStorage);

        let mut mail = DetachedMail::new(vec![
            "$Forwarded".to_owned(),
            "../escape".to_owned(),
            "a/b".to_owned(),
            "All".to_owned(),
            "Starred".to_owned(),
            "Keep".to_owned(),
        ]);
        router.on_keywords_updated(&mut setup.session, &mut mail, &[]);

        assert_eq!(vec!["Keep"], setup.mailboxes());
        assert!(!setup.root.path().join("escape").exists());
    }

    #[test]
    fn mail_copied_is_inert_by_default() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up();
        let router = EventRouter::new(&config, &FsStorage);

        let source = DetachedMail::new(vec![]);
        let mut destination = DetachedMail::new(vec![]);
        router.dispatch(
            &mut setup.session,
            Event::MailCopied {
                source: &source,
                destination: &mut destination,
            },
        );

        assert!(destination.keywords().unwrap().is_empty());
        assert!(setup.mailboxes().is_empty());
        assert!(setup.session.config().is_none());
    }

    #[test]
    fn mail_copied_tags_backend_and_provisions() {
        let config = VirtualKeywordsConfig {
            copy_keyword: Some("Copied".to_owned()),
            ..VirtualKeywordsConfig::default()
        };
        let mut setup = set_up();
        let router = EventRouter::new(&config, &FsStorage);

        let source = DetachedMail::new(vec![]);
        let mut destination = DetachedMail::new(vec!["Work".to_owned()]);
        router.dispatch(
            &mut setup.session,
            Event::MailCopied {
                source: &source,
                destination: &mut destination,
            },
        );

        assert_eq!(
            vec!["Work".to_owned(), "Copied".to_owned()],
            destination.keywords().unwrap()
        );
        assert_eq!(vec!["Copied"], setup.mailboxes());
        assert_eq!(
            Some("Virtual.All\n  KEYWORD Copied\n".to_owned()),
            setup.rule("Copied")
        );

        let mut orphan = OrphanMail;
        router.on_mail_copied(&mut setup.session, &source, &mut orphan);
        assert_eq!(vec!["Copied"], setup.mailboxes());
    }

    #[test]
    fn keywords_lazily_initialise_config() {
        let config = VirtualKeywordsConfig::default();
        let mut setup = set_up();
        let mut mail = DetachedMail::new(vec!["Work".to_owned()]);

        EventRouter::new(&config, &FsStorage).on_keywords_updated(
            &mut setup.session,
            &mut mail,
            &[],
        );
        assert_eq!("Virtual.", setup.session.config().unwrap().prefix());
        assert!(Path::new(&setup.virtual_root().join("Work")).is_dir());
    }
}
