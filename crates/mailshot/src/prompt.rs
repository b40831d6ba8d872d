//! Console prompts.
//!
//! dialoguer blocks on the terminal, so every prompt runs on the blocking
//! pool; the session task only waits.

use std::io;

use dialoguer::{Confirm, Input, Password, Select};
use zeroize::Zeroizing;

use mailshot_smtp::{AuthMechanism, CredentialProvider, Error};

/// Runs a dialoguer prompt off the async workers.
async fn blocking<T, F>(prompt: F) -> io::Result<T>
where
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(prompt)
        .await
        .map_err(io::Error::other)?
        .map_err(io::Error::other)
}

/// Asks a yes/no question.
///
/// # Errors
///
/// Returns an error if the terminal cannot be used.
pub async fn confirm(question: &str, default: bool) -> io::Result<bool> {
    let question = question.to_string();
    blocking(move || {
        Confirm::new()
            .with_prompt(question)
            .default(default)
            .interact()
    })
    .await
}

/// Asks for one line of text.
///
/// # Errors
///
/// Returns an error if the terminal cannot be used.
pub async fn text(label: &str, allow_empty: bool) -> io::Result<String> {
    let label = label.to_string();
    blocking(move || {
        Input::<String>::new()
            .with_prompt(label)
            .allow_empty(allow_empty)
            .interact_text()
    })
    .await
}

/// Credential and mechanism prompts on the terminal.
#[derive(Default)]
pub struct ConsolePrompter {
    preset_password: Option<Zeroizing<String>>,
}

impl ConsolePrompter {
    /// Creates a prompter; a preset password is used once instead of
    /// prompting.
    #[must_use]
    pub const fn new(preset_password: Option<Zeroizing<String>>) -> Self {
        Self { preset_password }
    }
}

impl std::fmt::Debug for ConsolePrompter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsolePrompter")
            .field("preset_password", &self.preset_password.as_ref().map(|_| "****"))
            .finish()
    }
}

impl CredentialProvider for ConsolePrompter {
    async fn password(&mut self, username: &str) -> mailshot_smtp::Result<Zeroizing<String>> {
        if let Some(password) = self.preset_password.take() {
            return Ok(password);
        }

        let label = format!("Password for {username}");
        let password = blocking(move || Password::new().with_prompt(label).interact())
            .await
            .map_err(|e| Error::Credentials(format!("password prompt failed: {e}")))?;
        Ok(Zeroizing::new(password))
    }

    async fn choose_mechanism(
        &mut self,
        candidates: &[AuthMechanism],
    ) -> mailshot_smtp::Result<AuthMechanism> {
        let items: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        let index = blocking(move || {
            Select::new()
                .with_prompt("Authentication method")
                .items(&items)
                .default(0)
                .interact()
        })
        .await
        .map_err(|e| Error::Credentials(format!("method selection failed: {e}")))?;

        candidates
            .get(index)
            .copied()
            .ok_or_else(|| Error::Credentials(format!("no method at position {index}")))
    }
}
