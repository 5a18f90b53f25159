//! Injected per-run secrets (provider API keys, pool messenger key).
//!
//! Values are never logged; `Debug` prints key names only.

use std::collections::HashMap;
use std::fmt;

use crate::crypto::EvmSigner;
use crate::error::FunctionError;

/// Environment prefix the CLI reads secrets from (`BRIDGE_SECRET_INFURA_API_KEY` -> `INFURA_API_KEY`).
pub const SECRET_ENV_PREFIX: &str = "BRIDGE_SECRET_";

/// Secret holding the hex private key used for pool transactions.
pub const POOL_MESSENGER_KEY: &str = "POOL_MESSENGER_0_PRIVATE_KEY";

#[derive(Clone, Default)]
pub struct Secrets {
    values: HashMap<String, String>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Secrets").field("keys", &keys).finish()
    }
}

impl Secrets {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Collects every environment variable starting with `prefix`, keyed by the remainder.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(std::env::vars(), prefix)
    }

    fn from_vars(vars: impl Iterator<Item = (String, String)>, prefix: &str) -> Self {
        let values = vars
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name.to_string(), value))
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn require(&self, name: &str) -> Result<&str, FunctionError> {
        self.get(name)
            .ok_or_else(|| FunctionError::NotFound(format!("Secret {} is not set", name)))
    }

    /// Replaces every `${NAME}` in `template` with the secret `NAME`.
    pub fn interpolate(&self, template: &str) -> Result<String, FunctionError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                FunctionError::InvalidArgument(format!(
                    "Unterminated placeholder in '{}'",
                    template
                ))
            })?;
            out.push_str(self.require(&after[..end])?);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Signer built from the pool messenger key.
    pub fn signer(&self) -> Result<EvmSigner, FunctionError> {
        let key = self.require(POOL_MESSENGER_KEY)?;
        EvmSigner::from_hex(key).map_err(FunctionError::from)
    }
}
