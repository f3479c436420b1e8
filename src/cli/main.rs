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

use std::fs;
use std::path::{Path, PathBuf};

use structopt::StructOpt;

use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
struct Options {
    /// The directory containing `virtual-keywords.toml` and `users/`
    /// [default: /etc/virtual-keywords or /usr/local/etc/virtual-keywords]
    #[structopt(long, parse(from_os_str))]
    root: Option<PathBuf>,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Create the fixed virtual mailboxes (All, Starred, and any configured
    /// extras) for a user.
    ///
    /// This is what happens when a user's session first starts. Mailboxes
    /// which already exist are left alone.
    Init(UserSubcommand),
    /// Create the virtual mailboxes for one or more keywords.
    ///
    /// This behaves as if a message belonging to the user had just been
    /// tagged with exactly the given keywords.
    Keywords(KeywordsSubcommand),
    /// Show the state of the user's virtual mailboxes.
    Status(UserSubcommand),
}

#[derive(StructOpt)]
pub(super) struct UserSubcommand {
    /// The name of the user, i.e., their directory under `users/`.
    pub(super) user: String,
}

#[derive(StructOpt)]
pub(super) struct KeywordsSubcommand {
    /// The name of the user, i.e., their directory under `users/`.
    pub(super) user: String,

    /// The keywords to create mailboxes for.
    #[structopt(required = true)]
    pub(super) keywords: Vec<String>,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let options = Options::from_clap(&match Options::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        }
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        }
    });

    let root = options.root.unwrap_or_else(|| {
        if Path::new("/etc/virtual-keywords/virtual-keywords.toml").is_file() {
            "/etc/virtual-keywords".to_owned().into()
        } else if Path::new(
            "/usr/local/etc/virtual-keywords/virtual-keywords.toml",
        )
        .is_file()
        {
            "/usr/local/etc/virtual-keywords".to_owned().into()
        } else {
            die!(
                EX_CONFIG,
                "Neither /etc/virtual-keywords nor\n\
                 /usr/local/etc/virtual-keywords looks like the system root;\n\
                 use --root=/path/to/root if your installation is elsewhere."
            )
        }
    });

    let system_config = load_system_config(&root);
    init_logging(&root);

    let users_root = root.join("users");
    if !users_root.is_dir() {
        die!(EX_CONFIG, "'{}' seems to be missing", users_root.display());
    }

    match options.command {
        Command::Init(cmd) => {
            super::commands::init(&system_config, &users_root, cmd)
        }
        Command::Keywords(cmd) => {
            super::commands::keywords(&system_config, &users_root, cmd)
        }
        Command::Status(cmd) => {
            super::commands::status(&system_config, &users_root, cmd)
        }
    }
}

fn load_system_config(root: &Path) -> SystemConfig {
    let system_config_path = root.join("virtual-keywords.toml");
    let system_config_toml = match fs::read_to_string(&system_config_path) {
        Ok(toml) => toml,
        Err(e) => die!(
            EX_CONFIG,
            "Error reading '{}': {}",
            system_config_path.display(),
            e
        ),
    };

    let config: SystemConfig = match toml::from_str(&system_config_toml) {
        Ok(config) => config,
        Err(e) => die!(
            EX_CONFIG,
            "Error in config file at '{}': {}",
            system_config_path.display(),
            e
        ),
    };

    if let Err(e) = config.virtual_keywords.validate() {
        die!(
            EX_CONFIG,
            "Error in config file at '{}': {}",
            system_config_path.display(),
            e
        );
    }

    config
}

fn init_logging(root: &Path) {
    if Ok(true) == nix::unistd::isatty(2) {
        // Running interactively; ignore logging configuration and just write
        // to stderr.
        init_simple_log();
        return;
    }

    let log_config_file = root.join("logging.toml");
    if log_config_file.is_file() {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::config::Deserializers::default(),
        ) {
            die!(
                EX_CONFIG,
                "Failed to initialise logging from '{}': {}",
                log_config_file.display(),
                e
            );
        }
    } else {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_MAIL,
            hostname: None,
            process: env!("CARGO_PKG_NAME").to_owned(),
            pid: nix::unistd::getpid().as_raw(),
        };

        let logger = match syslog::unix(formatter) {
            Ok(logger) => logger,
            Err(e) => die!(EX_SOFTWARE, "Failed to connect to syslog: {}", e),
        };
        if let Err(e) =
            log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
                .map(|_| log::set_max_level(log::LevelFilter::Info))
        {
            die!(EX_SOFTWARE, "Failed to initialise logging: {}", e);
        }
    }
}

fn init_simple_log() {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::config::{Appender, Config, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%H:%M:%S%.3f)} [{l}] {m}{n}",
        )))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(
            Root::builder()
                .appender("stderr")
                .build(log::LevelFilter::Info),
        );

    match config {
        Ok(config) => {
            if let Err(e) = log4rs::init_config(config) {
                die!(EX_SOFTWARE, "Failed to initialise logging: {}", e);
            }
        }
        Err(e) => die!(EX_SOFTWARE, "Bad built-in logging config: {}", e),
    }
}
