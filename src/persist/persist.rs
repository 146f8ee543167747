use std::fmt;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::error::{Result, StorageError, StoreError};
use crate::storage::StorageAdapter;

/// Which storage call a [`PersistReport`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// The initial read of a load cycle.
    Load,
    /// A write-through after a local change.
    Set,
    /// Deletion of the backing entry.
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Load => "load",
            Self::Set => "set",
            Self::Remove => "remove",
        })
    }
}

/// Outcome of one background storage call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistReport {
    pub key: String,
    pub operation: Operation,
    /// `None` on success, otherwise the rendered failure.
    pub error: Option<String>,
}

impl PersistReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Options shared by both container variants.
#[derive(Clone, Debug, Default)]
pub struct StoreOptions {
    /// Receives a report for every completed write and removal, and for
    /// every load that failed to read or decode.
    pub reports: Option<UnboundedSender<PersistReport>>,
}

impl StoreOptions {
    pub fn with_reports(reports: UnboundedSender<PersistReport>) -> Self {
        Self {
            reports: Some(reports),
        }
    }
}

/// Handle to a detached write or removal.
///
/// Dropping the handle leaves the task running. Awaiting [`wait`](Self::wait)
/// yields the storage outcome, which is otherwise only visible through logs
/// and the report channel.
#[must_use = "dropping the handle detaches the write; call `wait` to observe its outcome"]
#[derive(Debug)]
pub struct PersistHandle {
    task: JoinHandle<Result<()>>,
}

impl PersistHandle {
    /// Wait for the storage call to finish.
    pub async fn wait(self) -> Result<()> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(StoreError::TaskFailed(e.to_string())),
        }
    }

    /// Whether the storage call has completed.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Issues storage calls on background tasks.
pub(crate) struct Persister {
    storage: Arc<dyn StorageAdapter>,
    runtime: Handle,
    reports: Option<UnboundedSender<PersistReport>>,
}

impl Persister {
    pub(crate) fn new(storage: Arc<dyn StorageAdapter>, options: StoreOptions) -> Result<Self> {
        Ok(Self {
            storage,
            runtime: Handle::try_current()?,
            reports: options.reports,
        })
    }

    pub(crate) fn storage(&self) -> Arc<dyn StorageAdapter> {
        Arc::clone(&self.storage)
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Persist `raw` under `key` without waiting for the result.
    pub(crate) fn set(&self, key: String, raw: String) -> PersistHandle {
        let storage = Arc::clone(&self.storage);
        let reports = self.reports.clone();
        let task = self.runtime.spawn(async move {
            let result = storage.set(&key, &raw).await;
            finish(&reports, key, Operation::Set, result)
        });
        PersistHandle { task }
    }

    /// Delete the entry for `key` without waiting for the result.
    pub(crate) fn remove(&self, key: String) -> PersistHandle {
        let storage = Arc::clone(&self.storage);
        let reports = self.reports.clone();
        let task = self.runtime.spawn(async move {
            let result = storage.remove(&key).await;
            finish(&reports, key, Operation::Remove, result)
        });
        PersistHandle { task }
    }

    /// Report a load that fell back to "nothing stored".
    pub(crate) fn report_load_failure(&self, key: &str, error: String) {
        send(
            &self.reports,
            PersistReport {
                key: key.to_string(),
                operation: Operation::Load,
                error: Some(error),
            },
        );
    }
}

fn finish(
    reports: &Option<UnboundedSender<PersistReport>>,
    key: String,
    operation: Operation,
    result: Result<(), StorageError>,
) -> Result<()> {
    let error = match &result {
        Ok(()) => {
            tracing::debug!(key = key.as_str(), %operation, "persisted");
            None
        }
        Err(e) => {
            tracing::warn!(key = key.as_str(), %operation, error = %e, "persistence failed; in-memory value kept");
            Some(e.to_string())
        }
    };
    send(
        reports,
        PersistReport {
            key,
            operation,
            error,
        },
    );
    result.map_err(StoreError::from)
}

fn send(reports: &Option<UnboundedSender<PersistReport>>, report: PersistReport) {
    if let Some(reports) = reports {
        // A dropped receiver only means nobody is listening any more.
        let _ = reports.send(report);
    }
}
