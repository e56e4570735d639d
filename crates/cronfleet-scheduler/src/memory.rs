//! In-memory collaborators for tests and local runs.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use cronfleet_protocols::{
    CatalogError, CatalogSession, Job, JobCatalog, OperationCall, OperationError,
    OperationInstaller, OwnedJobIndex, PartitionDescriptor,
};

struct CatalogState {
    jobs: RwLock<HashMap<String, Job>>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
    fail_rollback: AtomicBool,
    sessions_opened: AtomicU64,
    rollbacks: AtomicU64,
}

/// In-memory job catalog.
///
/// Assigns IDs like a real catalog would, and can simulate outages and
/// failing rollbacks.
#[derive(Clone)]
pub struct MemoryJobCatalog {
    state: Arc<CatalogState>,
}

impl MemoryJobCatalog {
    pub fn new() -> Self {
        Self {
            state: Arc::new(CatalogState {
                jobs: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                unavailable: AtomicBool::new(false),
                fail_rollback: AtomicBool::new(false),
                sessions_opened: AtomicU64::new(0),
                rollbacks: AtomicU64::new(0),
            }),
        }
    }

    /// Persist a job, assigning an ID if it has none. Replaces any job with
    /// the same code; an update of a persisted code keeps its ID.
    pub fn save(&self, mut job: Job) -> Job {
        let mut jobs = self.state.jobs.write();
        if !job.is_persisted() {
            job.id = match jobs.get(&job.code).filter(|existing| existing.is_persisted()) {
                Some(existing) => existing.id,
                None => self.state.next_id.fetch_add(1, Ordering::SeqCst),
            };
        }
        jobs.insert(job.code.clone(), job.clone());
        job
    }

    /// Store a job without assigning an ID, as seen before its first persist.
    pub fn save_unpersisted(&self, mut job: Job) -> Job {
        job.id = 0;
        self.state.jobs.write().insert(job.code.clone(), job.clone());
        job
    }

    pub fn remove(&self, code: &str) -> Option<Job> {
        self.state.jobs.write().remove(code)
    }

    pub fn get(&self, code: &str) -> Option<Job> {
        self.state.jobs.read().get(code).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every lookup fail with [`CatalogError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every rollback fail with [`CatalogError::Release`].
    pub fn set_fail_rollback(&self, fail: bool) {
        self.state.fail_rollback.store(fail, Ordering::SeqCst);
    }

    pub fn sessions_opened(&self) -> u64 {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    /// Rollbacks attempted, including failed ones.
    pub fn rollbacks(&self) -> u64 {
        self.state.rollbacks.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), CatalogError> {
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryJobCatalog {
    fn default() -> Self {
        Self::new()
    }
}

struct MemorySession {
    state: Arc<CatalogState>,
}

#[async_trait]
impl CatalogSession for MemorySession {
    async fn find_by_code(&mut self, code: &str) -> Result<Option<Job>, CatalogError> {
        if self.state.unavailable.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("simulated outage".to_string()));
        }
        Ok(self.state.jobs.read().get(code).cloned())
    }

    async fn rollback(self: Box<Self>) -> Result<(), CatalogError> {
        self.state.rollbacks.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_rollback.load(Ordering::SeqCst) {
            return Err(CatalogError::Release("simulated rollback failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl JobCatalog for MemoryJobCatalog {
    async fn begin_read(&self) -> Result<Box<dyn CatalogSession>, CatalogError> {
        self.state.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            state: self.state.clone(),
        }))
    }
}

#[async_trait]
impl OwnedJobIndex for MemoryJobCatalog {
    async fn owned_job_codes(
        &self,
        partition: PartitionDescriptor,
    ) -> Result<Vec<String>, CatalogError> {
        self.check_available()?;
        let jobs = self.state.jobs.read();
        let mut owned: Vec<&Job> = jobs.values().filter(|job| partition.owns(job.id)).collect();
        owned.sort_by_key(|job| job.id);
        Ok(owned.into_iter().map(|job| job.code.clone()).collect())
    }
}

/// Operation installer that records every call it receives.
pub struct RecordingOperationInstaller {
    calls: Mutex<Vec<OperationCall>>,
    failing: AtomicBool,
    notify: Notify,
}

impl RecordingOperationInstaller {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Make every call fail after being recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<OperationCall> {
        self.calls.lock().clone()
    }

    /// Wait until at least `count` calls were received. Returns `false` on timeout.
    pub async fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.calls.lock().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

impl Default for RecordingOperationInstaller {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OperationInstaller for RecordingOperationInstaller {
    async fn execute(&self, call: &OperationCall) -> Result<(), OperationError> {
        self.calls.lock().push(call.clone());
        self.notify.notify_waiters();

        if self.failing.load(Ordering::SeqCst) {
            return Err(OperationError::Transport("simulated failure".to_string()));
        }
        Ok(())
    }
}
