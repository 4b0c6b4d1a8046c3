use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Default operating window: 7 days, after which the transport is torn down.
pub const DEFAULT_SESSION_SECS: u64 = 7 * 24 * 60 * 60;

/// Default cap on a single archived media payload.
pub const DEFAULT_MEDIA_MAX_BYTES: usize = 16 * 1024 * 1024;

/// Typed configuration, loaded from the environment (with `.env` support).
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the durable archive + pairing state.
    pub storage_dir: PathBuf,

    /// Bounded operating window before automatic shutdown.
    pub session_max_duration: Duration,

    /// Hard cap on a single view-once payload; larger downloads are skipped.
    pub media_max_bytes: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let storage_dir = env_path("JAGWAX_STORAGE_DIR")
            .unwrap_or_else(|| PathBuf::from("./jagwax-storage"));

        let session_max_duration =
            Duration::from_secs(env_u64("JAGWAX_SESSION_SECS").unwrap_or(DEFAULT_SESSION_SECS));
        if session_max_duration.is_zero() {
            return Err(Error::Config(
                "JAGWAX_SESSION_SECS must be greater than zero".to_string(),
            ));
        }

        let media_max_bytes =
            env_usize("JAGWAX_MEDIA_MAX_BYTES").unwrap_or(DEFAULT_MEDIA_MAX_BYTES);

        // Ensure the storage dir exists up front so store opens cannot race on it.
        fs::create_dir_all(&storage_dir)?;

        Ok(Self {
            storage_dir,
            session_max_duration,
            media_max_bytes,
        })
    }
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

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}
