//! Pairing registry: identity -> issued code.
//!
//! Low-assurance by design. Codes are short, requester-triggered and not rate
//! limited; they only gate the cosmetic "paired" confirmation, never
//! credential-grade authorization. Uniqueness is per identity, not global:
//! two identities may share a numeric suffix.

use std::{collections::HashMap, path::PathBuf};

use rand::Rng;
use tokio::sync::Mutex;

use crate::{domain::Identity, errors::Error, Result};

pub const CODE_PREFIX: &str = "JagX";

/// Identity -> issued code. One record per identity, held as a map entry.
pub struct PairingRegistry {
    /// `None` keeps the registry purely in-memory (tests).
    path: Option<PathBuf>,
    records: Mutex<HashMap<Identity, String>>,
}

impl PairingRegistry {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Open a registry durable at `path`, loading any previously issued codes
    /// so a restart does not silently invalidate them.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::Storage(format!("parse {}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(Error::Storage(format!("read {}: {e}", path.display()))),
        };

        Ok(Self {
            path: Some(path),
            records: Mutex::new(records),
        })
    }

    /// Issue a fresh code for `identity`, or return the existing one unchanged.
    pub async fn issue_or_get(&self, identity: &Identity) -> Result<String> {
        let mut records = self.records.lock().await;
        if let Some(existing) = records.get(identity) {
            return Ok(existing.clone());
        }

        let code = generate_code();
        records.insert(identity.clone(), code.clone());
        // A code is only issued once it is on disk; roll back otherwise.
        if let Err(e) = self.persist(&records).await {
            records.remove(identity);
            return Err(e);
        }
        Ok(code)
    }

    pub async fn get(&self, identity: &Identity) -> Option<String> {
        self.records.lock().await.get(identity).cloned()
    }

    /// Exact, case-sensitive match against the identity's own record.
    pub async fn verify(&self, identity: &Identity, submitted: &str) -> bool {
        self.records
            .lock()
            .await
            .get(identity)
            .is_some_and(|code| code == submitted)
    }

    /// Message bodies starting with the code prefix are treated as submitted codes.
    pub fn looks_like_code(body: &str) -> bool {
        body.starts_with(CODE_PREFIX)
    }

    async fn persist(&self, records: &HashMap<Identity, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec(records)
            .map_err(|e| Error::Storage(format!("encode {}: {e}", path.display())))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| Error::Storage(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::Storage(format!("rename {}: {e}", path.display())))?;
        Ok(())
    }
}

fn generate_code() -> String {
    let digits = rand::thread_rng().gen_range(1000..=9999);
    format!("{CODE_PREFIX}{digits}")
}
