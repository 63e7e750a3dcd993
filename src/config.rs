//! Process configuration, read once from the environment at startup.
//!
//! | Variable          | Meaning                          | Default |
//! |-------------------|----------------------------------|---------|
//! | `ALLOWED_DOMAINS` | comma-separated render targets   | empty (deny all) |
//! | `SERVER_PORT`     | listening port                   | 80      |
//! | `SERVER_MAX_WAIT` | render ceiling, milliseconds     | 20000   |
//! | `DELAY_EXECUTION` | settle delay, milliseconds       | 3000    |
//! | `ALLOW_CSS`       | fetch stylesheets                | false   |
//! | `SERVER_DEBUG`    | engine diagnostics / headful     | false   |

use crate::engine::EngineSettings;
use crate::gate::AllowedDomainSet;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 80;
pub const DEFAULT_MAX_WAIT_MS: u64 = 20_000;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 3_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub allowed_domains: AllowedDomainSet,
    pub debug: bool,
    pub max_wait: Duration,
    pub settle_delay: Duration,
    pub load_css: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            allowed_domains: AllowedDomainSet::default(),
            debug: false,
            max_wait: Duration::from_millis(DEFAULT_MAX_WAIT_MS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            load_css: false,
        }
    }
}

impl Config {
    /// Read the full configuration from the environment. Unset or unparsable
    /// values fall back to defaults; an unset allowlist stays empty, which
    /// denies every request rather than allowing any.
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("SERVER_PORT", DEFAULT_PORT),
            allowed_domains: std::env::var("ALLOWED_DOMAINS")
                .map(|csv| AllowedDomainSet::from_csv(&csv))
                .unwrap_or_default(),
            debug: env_flag("SERVER_DEBUG"),
            max_wait: Duration::from_millis(env_parsed("SERVER_MAX_WAIT", DEFAULT_MAX_WAIT_MS)),
            settle_delay: Duration::from_millis(env_parsed(
                "DELAY_EXECUTION",
                DEFAULT_SETTLE_DELAY_MS,
            )),
            load_css: env_flag("ALLOW_CSS"),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            debug: self.debug,
            max_wait: self.max_wait,
            settle_delay: self.settle_delay,
            load_css: self.load_css,
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Truthy unless unset, empty, "0", or "false" (case-insensitive).
fn env_flag(name: &str) -> bool {
    match std::env::var(name) {
        Ok(v) => {
            let v = v.trim();
            !(v.is_empty() || v == "0" || v.eq_ignore_ascii_case("false"))
        }
        Err(_) => false,
    }
}
