//! Background import coordination.
//!
//! [`ImportJobs`] owns a single job slot shared between the HTTP handlers and
//! the worker thread. Claiming the slot hands out a [`JobHandle`]; the handle
//! is the only writer of the status and releases the slot when it finishes,
//! or when it is dropped without finishing.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{error, info};

use crate::config::FetchSettings;
use crate::import::run_import;
use crate::ui::{Phase, Ui};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Snapshot served by `/scrape/status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub in_progress: bool,
    pub completed: bool,
    pub current_task: String,
    pub progress: u8,
    pub error: Option<String>,
    pub timestamp: Option<String>,
}

impl JobStatus {
    fn started() -> Self {
        Self {
            in_progress: true,
            completed: false,
            current_task: "Starting import...".to_string(),
            progress: 0,
            error: None,
            timestamp: Some(chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()),
        }
    }

    /// Whether the result page has something to show
    pub fn is_finished(&self) -> bool {
        self.completed || self.error.is_some()
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Scraping already in progress. Please wait.")]
    AlreadyRunning,

    #[error("Failed to start import thread: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Default)]
struct Shared {
    running: AtomicBool,
    status: RwLock<JobStatus>,
}

impl Shared {
    fn update(&self, f: impl FnOnce(&mut JobStatus)) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut status);
    }
}

/// Registry for the single import slot
#[derive(Clone, Default)]
pub struct ImportJobs {
    shared: Arc<Shared>,
}

impl ImportJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, resetting the status for a new run
    pub fn try_start(&self) -> Result<JobHandle, JobError> {
        self.shared
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| JobError::AlreadyRunning)?;

        self.shared.update(|status| *status = JobStatus::started());

        Ok(JobHandle {
            shared: Arc::clone(&self.shared),
            finished: false,
        })
    }

    pub fn status(&self) -> JobStatus {
        self.shared
            .status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Claim the slot and run a full import on a dedicated thread
    pub fn spawn_import(
        &self,
        fetch: FetchSettings,
        database: PathBuf,
    ) -> Result<JoinHandle<()>, JobError> {
        let handle = self.try_start()?;

        let worker = thread::Builder::new()
            .name("import".to_string())
            .spawn(move || {
                let mut ui = JobUi::new(handle);
                match run_import(&fetch, &database, &mut ui) {
                    Ok(summary) => {
                        info!(%summary, "Background import finished");
                        ui.into_handle().complete(format!(
                            "Import completed successfully! {} countries imported.",
                            summary.processed
                        ));
                    }
                    Err(err) => {
                        let message = format!("{:#}", err);
                        error!(error = %message, "Background import failed");
                        ui.into_handle().fail(message);
                    }
                }
            })?;

        Ok(worker)
    }
}

/// Write access to the status of the running job
pub struct JobHandle {
    shared: Arc<Shared>,
    finished: bool,
}

impl JobHandle {
    pub fn set_task(&self, label: impl Into<String>, progress: u8) {
        let label = label.into();
        self.shared.update(|status| {
            status.current_task = label;
            status.progress = progress.min(100);
        });
    }

    pub fn complete(mut self, message: impl Into<String>) {
        let message = message.into();
        self.shared.update(|status| {
            status.in_progress = false;
            status.completed = true;
            status.progress = 100;
            status.current_task = message;
        });
        self.release();
    }

    pub fn fail(mut self, message: impl Into<String>) {
        self.mark_failed(message.into());
    }

    fn mark_failed(&mut self, message: String) {
        self.shared.update(|status| {
            status.in_progress = false;
            status.completed = false;
            status.current_task = format!("Error occurred: {}", message);
            status.error = Some(message);
        });
        self.release();
    }

    fn release(&mut self) {
        self.finished = true;
        self.shared.running.store(false, Ordering::Release);
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        if !self.finished {
            self.mark_failed("Import stopped unexpectedly".to_string());
        }
    }
}

/// Progress on the 0-100 scale at the start of each phase
fn phase_progress(phase: Phase) -> Option<u8> {
    match phase {
        Phase::Fetching => Some(5),
        Phase::Clearing => Some(15),
        Phase::Importing => Some(20),
        Phase::Committing => Some(97),
        Phase::Complete => Some(100),
        Phase::Failed => None,
    }
}

/// Reports pipeline progress into a [`JobHandle`]
pub struct JobUi {
    handle: JobHandle,
    phase: Phase,
}

impl JobUi {
    pub fn new(handle: JobHandle) -> Self {
        Self {
            handle,
            phase: Phase::Fetching,
        }
    }

    pub fn into_handle(self) -> JobHandle {
        self.handle
    }
}

impl Ui for JobUi {
    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        if let Some(progress) = phase_progress(phase) {
            self.handle.set_task(format!("{}...", phase), progress);
        }
    }

    fn set_info(&mut self, _info: impl Into<String>) {}

    fn set_progress(&mut self, current: u64, total: u64, label: impl Into<String>) {
        if self.phase != Phase::Importing || total == 0 {
            return;
        }
        let ratio = (current as f64 / total as f64).min(1.0);
        let progress = 20 + (75.0 * ratio) as u8;
        self.handle.set_task(
            format!("Importing {} ({}/{})...", label.into().to_lowercase(), current, total),
            progress,
        );
    }

    fn clear_progress(&mut self) {}

    fn log(&mut self, _message: impl Into<String>) {}
}
