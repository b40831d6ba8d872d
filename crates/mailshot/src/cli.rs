//! Command line.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use zeroize::Zeroizing;

/// How the message is produced and sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Type SMTP commands by hand.
    #[default]
    Raw,
    /// Prompt for whatever is missing, then send.
    Send,
    /// Send the contents of files (`-` for stdin).
    File,
}

/// Send one email over SMTP with implicit TLS.
#[derive(Parser, Debug)]
#[command(name = "mailshot", version)]
#[command(about = "Send one email over SMTP with implicit TLS", long_about = None)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Session mode
    #[arg(long, value_enum, default_value_t = Mode::Raw)]
    pub mode: Mode,

    /// Print the supported AUTH mechanisms and exit
    #[arg(long)]
    pub list_auth: bool,

    /// AUTH mechanism to use when the server offers several
    #[arg(long, value_name = "METHOD")]
    pub auth: Option<String>,

    /// Sender address, also used as the AUTH username
    #[arg(long, value_name = "ADDRESS")]
    pub from: Option<String>,

    /// Recipients, separated by `;`
    #[arg(long, value_name = "ADDRESSES")]
    pub to: Option<String>,

    /// Subject line
    #[arg(long)]
    pub subject: Option<String>,

    /// Password for PLAIN (visible in the process list; prefer the prompt)
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// SMTP server
    #[arg(long)]
    pub host: Option<String>,

    /// SMTP server port (implicit TLS)
    #[arg(long)]
    pub port: Option<u16>,

    /// Name announced in EHLO
    #[arg(long, value_name = "NAME")]
    pub ehlo_name: Option<String>,

    /// Configuration file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Let the token helper keep its state in the working directory
    #[arg(long)]
    pub local_state: bool,

    /// Log protocol traffic
    #[arg(short, long)]
    pub verbose: bool,

    /// Message files for file mode
    #[arg(value_name = "FILE", last = true)]
    pub files: Vec<String>,
}

impl Cli {
    /// Moves the password out of the parsed options into a buffer that is
    /// wiped on drop.
    pub fn take_password(&mut self) -> Option<Zeroizing<String>> {
        self.password.take().map(Zeroizing::new)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_raw() {
        let cli = Cli::try_parse_from(["mailshot"]).unwrap();
        assert_eq!(cli.mode, Mode::Raw);
        assert!(!cli.verbose);
        assert!(cli.files.is_empty());
    }

    #[test]
    fn file_mode_with_files() {
        let cli = Cli::try_parse_from([
            "mailshot",
            "--mode",
            "file",
            "--from",
            "a@example.com",
            "--to",
            "b@example.org;c@example.org",
            "-v",
            "--",
            "body.txt",
            "-",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::File);
        assert_eq!(cli.to.as_deref(), Some("b@example.org;c@example.org"));
        assert!(cli.verbose);
        assert_eq!(cli.files, vec!["body.txt".to_string(), "-".to_string()]);
    }

    #[test]
    fn password_is_moved_out() {
        let mut cli = Cli::try_parse_from(["mailshot", "--password", "hunter2"]).unwrap();
        let password = cli.take_password().unwrap();
        assert_eq!(password.as_str(), "hunter2");
        assert!(cli.password.is_none());
        assert!(cli.take_password().is_none());
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["mailshot", "--mode", "gui"]).is_err());
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Cli::try_parse_from(["mailshot", "--port", "70000"]).is_err());
    }
}
