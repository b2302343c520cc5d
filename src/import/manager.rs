use std::{
    io::{Read, Seek},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::Serialize;
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};
use tracing::{error, info};

use super::{Error, ImportReport, Importer};
use crate::{
    repository::{Repository, StoreState},
    store,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ImportStatus {
    Idle,
    Running { id: u64, percent: u8, message: String },
    Completed { id: u64, report: ImportReport },
    Failed { id: u64, message: String },
    Cancelled { id: u64 },
}

impl ImportStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ImportStatus::Running { .. })
    }

    /// `true` once an import has stopped, however it ended.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            ImportStatus::Completed { .. }
                | ImportStatus::Failed { .. }
                | ImportStatus::Cancelled { .. }
        )
    }

    pub fn id(&self) -> Option<u64> {
        match self {
            ImportStatus::Idle => None,
            ImportStatus::Running { id, .. }
            | ImportStatus::Completed { id, .. }
            | ImportStatus::Failed { id, .. }
            | ImportStatus::Cancelled { id } => Some(*id),
        }
    }
}

/// Returned by [`ImportManager::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportStarted {
    pub id: u64,
    /// The running import that was aborted to make way for this one.
    pub superseded: Option<u64>,
}

struct Current {
    id: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    importer: Importer,
    status: watch::Sender<ImportStatus>,
    current: Mutex<Option<Current>>,
    next_id: AtomicU64,
}

/// Runs at most one import at a time in the background.
///
/// Starting an import while another is running aborts the running one first:
/// no further batches of the old feed are written once [`start`](Self::start)
/// returns. The outcome of each import is published as an [`ImportStatus`].
#[derive(Clone)]
pub struct ImportManager {
    inner: Arc<Inner>,
}

impl ImportManager {
    pub fn new(importer: Importer) -> Self {
        let (status, _) = watch::channel(ImportStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                importer,
                status,
                current: Mutex::new(None),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn importer(&self) -> &Importer {
        &self.inner.importer
    }

    pub fn status(&self) -> ImportStatus {
        self.inner.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ImportStatus> {
        self.inner.status.subscribe()
    }

    /// Supersedes any running import and starts importing `source`.
    pub async fn start<R>(&self, source: R) -> ImportStarted
    where
        R: Read + Seek + Send + 'static,
    {
        let mut current = self.inner.current.lock().await;
        let superseded = match current.take() {
            Some(previous) => Self::abort(&self.inner, previous).await,
            None => None,
        };

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.status.send_replace(ImportStatus::Running {
            id,
            percent: 0,
            message: "Starting import...".into(),
        });

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            let result = inner
                .importer
                .run(source, |progress| {
                    inner.status.send_replace(ImportStatus::Running {
                        id,
                        percent: progress.percent,
                        message: progress.message,
                    });
                })
                .await;
            let status = match result {
                Ok(report) => {
                    info!(id, "Import finished");
                    ImportStatus::Completed { id, report }
                }
                Err(Error::Cancelled) => ImportStatus::Cancelled { id },
                Err(err) => {
                    error!(id, "Import failed: {err}");
                    ImportStatus::Failed {
                        id,
                        message: err.to_string(),
                    }
                }
            };
            inner.status.send_replace(status);
        });
        *current = Some(Current { id, handle });
        ImportStarted { id, superseded }
    }

    /// Stops the running import, if any, and returns its id. Rows it already
    /// wrote stay. `None` when no import was running.
    pub async fn cancel(&self) -> Option<u64> {
        let mut current = self.inner.current.lock().await;
        match current.take() {
            Some(previous) => Self::abort(&self.inner, previous).await,
            None => None,
        }
    }

    /// Returns the id of the aborted import, or `None` if it had already
    /// finished on its own.
    async fn abort(inner: &Inner, previous: Current) -> Option<u64> {
        previous.handle.abort();
        // Wait for the task to drop its channel so the parse worker stops.
        match previous.handle.await {
            Err(err) if err.is_cancelled() => {
                info!(id = previous.id, "Import superseded");
                inner.status.send_replace(ImportStatus::Cancelled { id: previous.id });
                Some(previous.id)
            }
            _ => None,
        }
    }

    /// Resolves once the latest import has stopped and returns its final status.
    pub async fn wait(&self) -> ImportStatus {
        let mut status = self.subscribe();
        match status.wait_for(|status| !status.is_running()).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        }
    }

    /// `Importing` while an import runs, otherwise derived from row counts.
    pub async fn store_state(&self) -> Result<StoreState, store::Error> {
        if self.status().is_running() {
            return Ok(StoreState::Importing);
        }
        Repository::new(self.inner.importer.store().clone())
            .state()
            .await
    }
}
