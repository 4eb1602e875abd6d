use std::env;
use std::str::FromStr;
use tracing::warn;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_CHANNEL_CAPACITY: usize = 100;
const DEFAULT_GLOBAL_CHANNEL_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub redis_url: Option<String>,
    pub doctor_seed_path: Option<String>,
    /// Buffer size of each per-appointment notification channel.
    pub channel_capacity: usize,
    /// Buffer size of the global doctor-status broadcast channel.
    pub global_channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            redis_url: None,
            doctor_seed_path: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            global_channel_capacity: DEFAULT_GLOBAL_CHANNEL_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            host: env::var("HOST")
                .unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_or_default("PORT", DEFAULT_PORT),
            redis_url: optional_var("REDIS_URL"),
            doctor_seed_path: optional_var("DOCTOR_SEED_PATH"),
            channel_capacity: parse_or_default("CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY),
            global_channel_capacity: parse_or_default(
                "GLOBAL_CHANNEL_CAPACITY",
                DEFAULT_GLOBAL_CHANNEL_CAPACITY,
            ),
        };

        if !config.is_redis_configured() {
            warn!("REDIS_URL not set, appointments and doctors are kept in memory");
        }

        config
    }

    pub fn is_redis_configured(&self) -> bool {
        self.redis_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
