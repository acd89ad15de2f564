//! Webhook secret lookup.

use std::collections::HashMap;

/// Key-value lookup used to source default webhook secrets.
pub trait SecretLookup: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl SecretLookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl SecretLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Environment variable holding the default secret for `repo_name`.
///
/// `AM-Suisse` becomes `WEBHOOK_SECRET_AM_SUISSE`.
pub fn secret_env_var(repo_name: &str) -> String {
    let suffix: String = repo_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("WEBHOOK_SECRET_{suffix}")
}
