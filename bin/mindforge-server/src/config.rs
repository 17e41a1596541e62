//! Server configuration, loaded from environment variables at startup.

use std::time::Duration;

use mindforge_core::SimulatorConfig;

/// Runtime configuration for mindforge-server.
///
/// Every field has a default so the server runs without any environment
/// variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:4202"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated list of allowed CORS origins. `None` or an empty list
    /// allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Mount Swagger UI at `/swagger-ui`.
    pub enable_swagger: bool,

    /// Load the demo content and task history at startup.
    pub seed_demo: bool,

    /// Delay between creating a task and its simulated start.
    pub task_start_delay: Duration,

    /// Interval of the progress simulator tick.
    pub task_tick_interval: Duration,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let cors = env_or("MINDFORGE_CORS_ORIGINS", "http://localhost:4201");
        Self {
            bind_address: env_or("MINDFORGE_BIND", "0.0.0.0:4202"),
            log_level: env_or("MINDFORGE_LOG", "info"),
            log_json: flag_env("MINDFORGE_LOG_JSON", false),
            cors_allowed_origins: (!cors.trim().is_empty()).then_some(cors),
            enable_swagger: flag_env("MINDFORGE_ENABLE_SWAGGER", true),
            seed_demo: flag_env("MINDFORGE_SEED_DEMO", true),
            task_start_delay: Duration::from_millis(parse_env(
                "MINDFORGE_TASK_START_DELAY_MS",
                1000,
            )),
            task_tick_interval: Duration::from_millis(parse_env("MINDFORGE_TASK_TICK_MS", 2000)),
        }
    }

    pub fn simulator(&self) -> SimulatorConfig {
        SimulatorConfig {
            start_delay: self.task_start_delay,
            tick_interval: self.task_tick_interval,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4202".to_owned(),
            log_level: "info".to_owned(),
            log_json: false,
            cors_allowed_origins: None,
            enable_swagger: true,
            seed_demo: true,
            task_start_delay: Duration::from_millis(1000),
            task_tick_interval: Duration::from_millis(2000),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn flag_env(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
