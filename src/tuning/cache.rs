use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tuning::{Target, TuningConfig, WorkloadKey};

/// Process-wide store of tuning decisions.
///
/// Implementations must keep concurrent updates to distinct keys from
/// corrupting each other.
pub trait TuningCache: Send + Sync {
    /// Returns the stored config, or [`TuningConfig::fallback`] when the
    /// workload was never tuned for `target`.
    fn query(&self, target: &Target, workload: &WorkloadKey) -> TuningConfig;

    fn update(&self, target: &Target, workload: WorkloadKey, config: TuningConfig);
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to access tuning log '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed tuning log: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LogKey {
    target: Target,
    workload: WorkloadKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TuningRecord {
    pub target: Target,
    pub workload: WorkloadKey,
    pub config: TuningConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TuningLogFile {
    records: Vec<TuningRecord>,
}

/// In-memory [`TuningCache`] that can be loaded from and saved to JSON.
#[derive(Debug, Default)]
pub struct TuningLog {
    entries: Mutex<HashMap<LogKey, TuningConfig>>,
}

impl TuningLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = TuningRecord>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| {
                (
                    LogKey {
                        target: record.target,
                        workload: record.workload,
                    },
                    record.config,
                )
            })
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Loads a log written by [`TuningLog::save`]. A missing file yields an
    /// empty log.
    pub fn load(path: &Path) -> Result<Self, TuningError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(source) => {
                return Err(TuningError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let file: TuningLogFile = serde_json::from_str(&content)?;
        Ok(Self::from_records(file.records))
    }

    pub fn save(&self, path: &Path) -> Result<(), TuningError> {
        let file = TuningLogFile {
            records: self.records(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(path, content).map_err(|source| TuningError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, target: &Target, workload: &WorkloadKey) -> Option<TuningConfig> {
        let key = LogKey {
            target: target.clone(),
            workload: workload.clone(),
        };
        self.lock_entries().get(&key).cloned()
    }

    /// All records, sorted by target then workload.
    pub fn records(&self) -> Vec<TuningRecord> {
        let mut records = self
            .lock_entries()
            .iter()
            .map(|(key, config)| TuningRecord {
                target: key.target.clone(),
                workload: key.workload.clone(),
                config: config.clone(),
            })
            .collect::<Vec<_>>();
        records.sort_by(|a, b| {
            a.target
                .cmp(&b.target)
                .then_with(|| a.workload.cmp(&b.workload))
        });
        records
    }

    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<LogKey, TuningConfig>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl TuningCache for TuningLog {
    fn query(&self, target: &Target, workload: &WorkloadKey) -> TuningConfig {
        self.get(target, workload)
            .unwrap_or_else(TuningConfig::fallback)
    }

    fn update(&self, target: &Target, workload: WorkloadKey, config: TuningConfig) {
        self.lock_entries().insert(
            LogKey {
                target: target.clone(),
                workload,
            },
            config,
        );
    }
}
