//! Ambient configuration (§4.10). Plain data — this crate never reads a file
//! or environment variable itself; a consuming binary parses
//! `LoginCoreConfig` from TOML (or builds it programmatically) and hands it
//! to `StashStore` and the `LoginFetch` implementation it constructs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_scrypt_target_ms() -> u32 {
    2_000
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginCoreConfig {
    pub stash_dir: PathBuf,
    pub api_base_url: String,
    pub api_key: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_scrypt_target_ms")]
    pub scrypt_target_ms: u32,
}

impl Default for LoginCoreConfig {
    fn default() -> Self {
        LoginCoreConfig {
            stash_dir: PathBuf::from("logins"),
            api_base_url: "https://auth.edge.example".to_string(),
            api_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            scrypt_target_ms: default_scrypt_target_ms(),
        }
    }
}

impl LoginCoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, crate::error::Error> {
        toml::from_str(text).map_err(|e| {
            crate::error::ErrorKind::InvalidStash(format!("invalid config: {e}")).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml_and_fills_in_defaults() {
        let cfg = LoginCoreConfig::from_toml_str(
            r#"
            stash_dir = "logins"
            api_base_url = "https://auth.example"
            api_key = "abc123"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.request_timeout_ms, 30_000);
        assert_eq!(cfg.scrypt_target_ms, 2_000);
    }
}
