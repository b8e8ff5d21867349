//! # Runtime Configuration
//!
//! Environment-driven settings applied before serving.
//!
//! | Variable | Default | Meaning |
//! |---|---|---|
//! | `SWITCHYARD_STACK_SIZE` | `0x8000` | coroutine stack size, decimal or `0x` hex |
//! | `SWITCHYARD_DEBUG` | `false` | show internal error messages in 500 bodies |
//! | `SWITCHYARD_ADDR` | `127.0.0.1:8080` | listen address of the demo binary |
//!
//! ```rust
//! use switchyard::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

use tracing::info;

pub const DEFAULT_STACK_SIZE: usize = 0x8000;
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
    pub debug: bool,
    pub addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            debug: false,
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Like [`RuntimeConfig::from_env`], reading variables through `var`.
    /// Unparseable values fall back to the defaults.
    pub fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let stack_size = var("SWITCHYARD_STACK_SIZE")
            .and_then(|v| parse_size(&v))
            .unwrap_or(DEFAULT_STACK_SIZE);
        let debug = var("SWITCHYARD_DEBUG")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        let addr = var("SWITCHYARD_ADDR")
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        Self {
            stack_size,
            debug,
            addr,
        }
    }

    /// Configure the `may` runtime's coroutine stack size.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        info!(stack_size = self.stack_size, "Coroutine runtime configured");
    }
}

fn parse_size(value: &str) -> Option<usize> {
    let value = value.trim();
    match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(pairs: &'static [(&'static str, &'static str)]) -> RuntimeConfig {
        RuntimeConfig::from_vars(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        })
    }

    #[test]
    fn test_defaults() {
        assert_eq!(with(&[]), RuntimeConfig::default());
    }

    #[test]
    fn test_stack_size_hex_and_decimal() {
        assert_eq!(with(&[("SWITCHYARD_STACK_SIZE", "0x4000")]).stack_size, 0x4000);
        assert_eq!(with(&[("SWITCHYARD_STACK_SIZE", "65536")]).stack_size, 65536);
        assert_eq!(
            with(&[("SWITCHYARD_STACK_SIZE", "lots")]).stack_size,
            DEFAULT_STACK_SIZE
        );
    }

    #[test]
    fn test_debug_and_addr() {
        let config = with(&[("SWITCHYARD_DEBUG", "true"), ("SWITCHYARD_ADDR", "0.0.0.0:9000")]);
        assert!(config.debug);
        assert_eq!(config.addr, "0.0.0.0:9000");
        assert!(!with(&[("SWITCHYARD_DEBUG", "nope")]).debug);
    }
}
