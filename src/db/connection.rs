use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc, Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info};
use rusqlite::Connection;
use tokio::sync::oneshot;

use super::migrations::run_migrations;

type Job = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Owns the job queue and the thread draining it.
///
/// Dropping the last sender ends the worker loop, so shutdown is a drop
/// followed by a join.
struct Worker {
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    data_version: AtomicU64,
}

impl Worker {
    fn sender(&self) -> Result<mpsc::Sender<Job>> {
        self.jobs
            .lock()
            .map_err(|_| anyhow!("database job queue lock poisoned"))?
            .clone()
            .ok_or_else(|| anyhow!("database worker already stopped"))
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let jobs = self.jobs.get_mut().unwrap_or_else(|p| p.into_inner());
        jobs.take();

        let thread = self.thread.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = thread.take() {
            if handle.join().is_err() {
                error!("Database worker panicked before shutdown");
            }
        }
    }
}

/// Handle to the SQLite event store.
///
/// All statements run on one dedicated worker thread; clones share it.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    path: Arc<PathBuf>,
}

/// Open the store and bring its schema up to date.
fn open_store(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database at {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        error!("Failed to enable WAL mode: {err}");
    }
    conn.busy_timeout(Duration::from_secs(5))
        .context("failed to set busy timeout")?;

    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

impl Database {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let (opened_tx, opened_rx) = mpsc::channel::<Result<()>>();
        let thread_path = path.clone();

        let thread = thread::Builder::new()
            .name("reelstats-db".into())
            .spawn(move || {
                let mut conn = match open_store(&thread_path) {
                    Ok(conn) => {
                        let _ = opened_tx.send(Ok(()));
                        conn
                    }
                    Err(err) => {
                        let _ = opened_tx.send(Err(err));
                        return;
                    }
                };

                for job in job_rx.iter() {
                    job(&mut conn);
                }
                debug!("Database worker for {} stopped", thread_path.display());
            })
            .context("failed to spawn database worker thread")?;

        let worker = Worker {
            jobs: Mutex::new(Some(job_tx)),
            thread: Mutex::new(Some(thread)),
            data_version: AtomicU64::new(0),
        };
        // On failure the worker is dropped here, which joins the exited thread.
        opened_rx
            .recv()
            .context("database worker exited before opening the store")??;

        info!("Event store ready at {}", path.display());
        Ok(Self {
            worker: Arc::new(worker),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Monotonic counter of committed writes made through this handle.
    pub fn current_version(&self) -> u64 {
        self.worker.data_version.load(Ordering::Acquire)
    }

    pub(crate) fn bump_version(&self) {
        self.worker.data_version.fetch_add(1, Ordering::AcqRel);
    }

    /// Run `task` on the worker thread and await its result.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |conn| {
            // The caller may have given up waiting; nothing to do then.
            let _ = reply_tx.send(task(conn));
        });

        self.worker
            .sender()?
            .send(job)
            .map_err(|_| anyhow!("database worker is not accepting jobs"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database worker dropped the job"))?
    }
}
