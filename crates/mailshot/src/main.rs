//! `mailshot` - send one email over SMTP with implicit TLS.
//!
//! Three modes share one engine: `raw` passes typed commands through,
//! `send` prompts for the message, `file` reads it from files.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod config;
mod exit;
mod logging;
mod prompt;
mod source;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use mailshot_oauth::{HelperTokenProvider, decode_error_challenge};
use mailshot_smtp::{
    Address, AuthMechanism, AuthNegotiator, Delivery, OutgoingMessage, RawOptions, SessionConfig,
    run_raw, send_mail,
};

use cli::{Cli, Mode};
use config::Settings;
use exit::Failure;
use prompt::ConsolePrompter;

type Negotiator = AuthNegotiator<ConsolePrompter, HelperTokenProvider>;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => std::process::exit(parse_failure(&e)),
    };

    logging::init(cli.verbose);

    let code = match run(cli).await {
        Ok(()) => exit::OK,
        Err(failure) => {
            report(&failure);
            failure.exit_code()
        }
    };
    std::process::exit(code);
}

/// Prints a clap usage error or help text and returns the exit code.
///
/// Help and version go to stdout and exit 0; if that write fails the run
/// counts as an I/O failure.
fn parse_failure(e: &clap::Error) -> i32 {
    let code = if e.use_stderr() {
        exit::BAD_COMMAND_LINE
    } else {
        exit::OK
    };
    match e.print() {
        Ok(()) => code,
        Err(_) if code == exit::OK => exit::IO_ERROR,
        Err(_) => code,
    }
}

async fn run(mut cli: Cli) -> Result<(), Failure> {
    if cli.list_auth {
        for mechanism in AuthMechanism::ALL {
            println!("{mechanism}");
        }
        return Ok(());
    }

    let file = config::load(cli.config.as_deref())
        .await
        .map_err(Failure::Config)?;
    let settings = Settings::resolve(&cli, file)?;

    let session = SessionConfig::builder(settings.host.clone())
        .port(settings.port)
        .ehlo_name(settings.ehlo_name.clone())
        .build();

    let tokens =
        HelperTokenProvider::new(settings.token_command.clone()).use_local_state(cli.local_state);
    let prompter = ConsolePrompter::new(cli.take_password());
    let mut negotiator =
        AuthNegotiator::new(prompter, tokens).with_preferred(settings.auth_method);

    match cli.mode {
        Mode::Raw => raw_mode(&session, &settings, &mut negotiator).await,
        Mode::Send => send_mode(&cli, &session, &settings, &mut negotiator).await,
        Mode::File => file_mode(&cli, &session, &settings, &mut negotiator).await,
    }
}

async fn raw_mode(
    session: &SessionConfig,
    settings: &Settings,
    negotiator: &mut Negotiator,
) -> Result<(), Failure> {
    println!("Raw SMTP client:");

    let auto_ehlo = prompt::confirm("Automatically send EHLO?", true).await?;
    let auto_auth = prompt::confirm("Automatically generate & submit authentication?", true).await?;
    let username = match (&settings.username, auto_auth) {
        (Some(username), _) => username.clone(),
        (None, true) => prompt::text("Username", false).await?,
        (None, false) => String::new(),
    };

    let options = RawOptions {
        auto_ehlo,
        auto_auth,
        username,
    };
    let input = BufReader::new(tokio::io::stdin()).lines();

    run_raw(session, options, input, tokio::io::stdout(), negotiator).await?;
    info!("Transaction complete");
    Ok(())
}

async fn send_mode(
    cli: &Cli,
    session: &SessionConfig,
    settings: &Settings,
    negotiator: &mut Negotiator,
) -> Result<(), Failure> {
    let from = match &settings.username {
        Some(from) => from.clone(),
        None => prompt::text("From", false).await?,
    };
    let to = match &cli.to {
        Some(to) => to.clone(),
        None => prompt::text("To (separate with ;)", false).await?,
    };
    let subject = match &cli.subject {
        Some(subject) => subject.clone(),
        None => prompt::text("Subject", true).await?,
    };

    println!("Message body, end with a line containing only '.':");
    let lines = source::read_until_dot(BufReader::new(tokio::io::stdin())).await?;

    let message = build_message(&from, &to, subject, lines)?;
    let delivery = send_mail(session, &message, negotiator).await?;
    summarize(&delivery);
    Ok(())
}

async fn file_mode(
    cli: &Cli,
    session: &SessionConfig,
    settings: &Settings,
    negotiator: &mut Negotiator,
) -> Result<(), Failure> {
    let from = settings
        .username
        .as_deref()
        .ok_or_else(|| Failure::Usage("file mode needs --from".into()))?;
    let to = cli
        .to
        .as_deref()
        .ok_or_else(|| Failure::Usage("file mode needs --to".into()))?;
    if cli.files.is_empty() {
        return Err(Failure::Usage("file mode needs at least one file after --".into()));
    }

    let lines = source::read_files(&cli.files).await?;
    let subject = cli.subject.clone().unwrap_or_default();

    let message = build_message(from, to, subject, lines)?;
    let delivery = send_mail(session, &message, negotiator).await?;
    summarize(&delivery);
    Ok(())
}

/// Validates addresses and assembles the message.
fn build_message(
    from: &str,
    to: &str,
    subject: String,
    lines: Vec<String>,
) -> Result<OutgoingMessage, Failure> {
    let from = Address::new(from).map_err(|e| Failure::InvalidOption(e.to_string()))?;
    let recipients = Address::parse_list(to).map_err(|e| Failure::InvalidOption(e.to_string()))?;
    if recipients.is_empty() {
        return Err(Failure::Usage("no recipients given".into()));
    }

    Ok(OutgoingMessage {
        from,
        recipients,
        subject,
        lines,
    })
}

fn summarize(delivery: &Delivery) {
    println!("Message sent to {} recipient(s)", delivery.accepted.len());
    for (rcpt, reply) in &delivery.skipped {
        println!("Skipped {rcpt}: {}", reply.text());
    }
}

fn report(failure: &Failure) {
    eprintln!("mailshot: {failure}");

    if let Failure::Smtp(mailshot_smtp::Error::AuthenticationFailed { message, .. }) = failure {
        if let Some(status) = decode_error_challenge(message) {
            warn!(
                "Token rejected (status {}, scope {})",
                status.status,
                status.scope.as_deref().unwrap_or("unspecified")
            );
        }
    }
}
