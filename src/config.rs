use std::{fmt::Display, path::PathBuf, str::FromStr};

use anyhow::Context;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub media_root: PathBuf,
    pub session_inactivity_minutes: i64,
    pub secure_cookies: bool,
    pub reviews_shown: i64,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://docnet.db")?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:8080")?,
            media_root: try_load("MEDIA_ROOT", "media")?,
            session_inactivity_minutes: try_load("SESSION_INACTIVITY_MINUTES", "60")?,
            secure_cookies: try_load("SECURE_COOKIES", "false")?,
            reviews_shown: try_load("REVIEWS_SHOWN", "10")?,
            max_upload_bytes: try_load("MAX_UPLOAD_BYTES", "10485760")?,
        })
    }
}

#[cfg(test)]
impl Config {
    pub(crate) fn for_tests(media_root: PathBuf) -> Self {
        Self {
            database_url: "sqlite::memory:".to_owned(),
            bind_addr: "127.0.0.1:0".to_owned(),
            media_root,
            session_inactivity_minutes: 60,
            secure_cookies: false,
            reviews_shown: 10,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = dotenv::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value {raw:?}"))
}
