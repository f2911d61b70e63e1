//! Credential callbacks for remote operations

use git2::{Config, Cred, CredentialType, RemoteCallbacks};

/// Give up after this many credential prompts for one operation; libgit2
/// keeps asking while credentials are rejected.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Build remote callbacks that authenticate without user interaction.
///
/// SSH remotes use the running SSH agent; HTTPS remotes use the configured
/// git credential helper. Local and unauthenticated remotes never reach
/// the callback.
pub fn remote_callbacks<'a>(config: Option<Config>) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;

    callbacks.credentials(move |url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CREDENTIAL_ATTEMPTS {
            return Err(git2::Error::from_str(&format!(
                "authentication to {url} failed after {MAX_CREDENTIAL_ATTEMPTS} attempts"
            )));
        }

        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && let Some(config) = &config
        {
            return Cred::credential_helper(config, url, username_from_url);
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return Cred::default();
        }

        Err(git2::Error::from_str(&format!(
            "no supported credential type for {url}"
        )))
    });

    callbacks
}
