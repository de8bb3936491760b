//! Tracing / logging initialisation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level per component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Override per component: crate name → level
    #[serde(default)]
    pub components: HashMap<String, String>,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: HashMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Build from `CHAINWEB3_LOG` (a JSON `LogConfig`), then apply the
    /// `--log-level`, `--log-json` and `--log-component <crate=level>` flags.
    pub fn from_env_and_args(env: Option<&str>, args: &[String]) -> Result<Self, String> {
        let mut config = match env {
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| format!("CHAINWEB3_LOG is not a valid log config: {e}"))?,
            None => Self::default(),
        };

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--log-level" => {
                    if let Some(level) = iter.next() {
                        config.level = level.clone();
                    }
                }
                "--log-json" => config.json = true,
                "--log-component" => {
                    let spec = iter.next().ok_or("--log-component needs <crate=level>")?;
                    let (component, level) = spec
                        .split_once('=')
                        .ok_or_else(|| format!("--log-component expects <crate=level>, got {spec}"))?;
                    config.components.insert(component.to_string(), level.to_string());
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Filter directives, e.g. `"info,chainweb3_core=debug"`.
    pub fn directives(&self) -> String {
        let mut components: Vec<_> = self.components.iter().collect();
        components.sort();
        let mut directives = self.level.clone();
        for (component, level) in components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Initialise tracing once at startup. `RUST_LOG`, when set, wins over the
/// config. Logs go to stderr so command output stays machine-readable.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directives()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
