//! CLI command implementations.

pub mod alarms;
pub mod dump_log;
pub mod expire;
pub mod patch;
pub mod snapshot;

use raas_core::{
    BackendKind, CoreError, LogStoreConfig, PartitionKey, Store, StoreConfig, SubpartitionLayout,
};
use raas_log::{FileLog, LogError, PartitionedLog};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the CLI itself.
#[derive(Debug, Error)]
pub enum CliError {
    /// The log backend was selected without a log directory.
    #[error("log directory required for the {0} backend (use --log-dir)")]
    MissingLogDir(BackendKind),

    /// The command only works on the log backend.
    #[error("{0} requires the log backend")]
    LogBackendOnly(&'static str),

    /// Store error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Log error.
    #[error(transparent)]
    Log(#[from] LogError),
}

/// Store selection shared by every command.
#[derive(Debug, Clone)]
pub struct StoreArgs {
    pub backend: BackendKind,
    pub log_dir: Option<PathBuf>,
    pub domain: String,
    pub adapter: String,
    pub subpartitions: u32,
    pub retention_secs: Option<u64>,
}

impl StoreArgs {
    /// Returns the partition every command operates on.
    pub fn partition(&self) -> PartitionKey {
        PartitionKey::new(&self.domain, &self.adapter)
    }

    /// Builds the store configuration.
    pub fn config(&self) -> Result<StoreConfig, CliError> {
        let mut log = LogStoreConfig::new();
        if let Some(secs) = self.retention_secs {
            log = log.retention(Duration::from_secs(secs));
        }
        Ok(StoreConfig::new()
            .backend(self.backend)
            .layout(SubpartitionLayout::new(self.subpartitions)?)
            .log(log))
    }

    /// Opens the log directory.
    pub fn open_log(&self) -> Result<Arc<FileLog>, CliError> {
        let dir = self
            .log_dir
            .as_ref()
            .ok_or(CliError::MissingLogDir(self.backend))?;
        Ok(Arc::new(FileLog::open(dir)?))
    }

    /// Opens the configured store.
    pub fn open_store(&self) -> Result<Store, CliError> {
        let config = self.config()?;
        let log: Option<Arc<dyn PartitionedLog>> = match self.backend {
            BackendKind::Log => Some(self.open_log()? as Arc<dyn PartitionedLog>),
            BackendKind::Reference => None,
        };
        Ok(Store::open(&config, log)?)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn log_args(dir: &std::path::Path) -> StoreArgs {
        StoreArgs {
            backend: BackendKind::Log,
            log_dir: Some(dir.to_path_buf()),
            domain: "ala".into(),
            adapter: "ma".into(),
            subpartitions: 2,
            retention_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raas_core::AlarmStore;

    #[test]
    fn log_backend_requires_dir() {
        let args = StoreArgs {
            log_dir: None,
            ..test_support::log_args(std::path::Path::new("."))
        };
        assert!(matches!(args.open_store(), Err(CliError::MissingLogDir(_))));
    }

    #[test]
    fn opens_both_backends() {
        let dir = tempfile::tempdir().unwrap();
        let args = test_support::log_args(dir.path());
        assert_eq!(args.open_store().unwrap().backend_name(), "log");

        let args = StoreArgs {
            backend: BackendKind::Reference,
            log_dir: None,
            ..args
        };
        assert_eq!(args.open_store().unwrap().backend_name(), "reference");
    }

    #[test]
    fn zero_subpartitions_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let args = StoreArgs {
            subpartitions: 0,
            ..test_support::log_args(dir.path())
        };
        assert!(matches!(args.config(), Err(CliError::Core(CoreError::Config { .. }))));
    }
}
