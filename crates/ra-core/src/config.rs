use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Telegram caps `getUpdates` at 100 updates per call.
pub const MAX_BATCH_SIZE: usize = 100;

/// Which persistence engine backs the bot, with its connection parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Files {
        base_path: PathBuf,
    },
    Sqlite {
        path: PathBuf,
    },
    Mongo {
        uri: String,
        database: String,
        collection: String,
    },
}

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: Option<String>,

    // Storage
    pub storage: StorageBackend,
    pub storage_init_timeout: Duration,

    // Polling
    pub batch_size: usize,
    pub idle_sleep: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the process env in `load`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let telegram_api_url = get("TELEGRAM_API_URL");

        let backend = get("STORAGE_BACKEND")
            .unwrap_or_else(|| "sqlite".to_string())
            .trim()
            .to_lowercase();
        let storage = match backend.as_str() {
            "memory" => StorageBackend::Memory,
            "files" | "file" => StorageBackend::Files {
                base_path: PathBuf::from(
                    get("FILE_STORAGE_PATH").unwrap_or_else(|| ".file-storage".to_string()),
                ),
            },
            "sqlite" => StorageBackend::Sqlite {
                path: PathBuf::from(
                    get("SQLITE_PATH").unwrap_or_else(|| ".sqlite/storage.db".to_string()),
                ),
            },
            "mongo" | "mongodb" => StorageBackend::Mongo {
                uri: get("MONGODB_CONNECTION").ok_or_else(|| {
                    Error::Config(
                        "MONGODB_CONNECTION is required when STORAGE_BACKEND=mongo".to_string(),
                    )
                })?,
                database: get("MONGODB_DATABASE").unwrap_or_else(|| "read-adviser".to_string()),
                collection: get("MONGODB_COLLECTION").unwrap_or_else(|| "pages".to_string()),
            },
            other => {
                return Err(Error::Config(format!(
                    "unknown STORAGE_BACKEND: {other} (expected sqlite, files, mongo or memory)"
                )))
            }
        };

        let storage_init_timeout =
            Duration::from_millis(parse_u64(&get, "STORAGE_INIT_TIMEOUT_MS")?.unwrap_or(5_000));
        let batch_size = (parse_u64(&get, "BATCH_SIZE")?.unwrap_or(MAX_BATCH_SIZE as u64) as usize)
            .clamp(1, MAX_BATCH_SIZE);
        let idle_sleep = Duration::from_millis(parse_u64(&get, "IDLE_SLEEP_MS")?.unwrap_or(1_000));

        Ok(Self {
            telegram_bot_token,
            telegram_api_url,
            storage,
            storage_init_timeout,
            batch_size,
            idle_sleep,
        })
    }
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    get(key)
        .map(|s| {
            s.trim()
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("{key} must be a non-negative integer, got {s:?}")))
        })
        .transpose()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
