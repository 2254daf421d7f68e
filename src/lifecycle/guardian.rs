//! Process guardian
//!
//! One instance per process. Unrecoverable faults (panics, failed background
//! tasks, fatal datastore signals) are funnelled into it as
//! [`ProcessFaultEvent`]s. The first event moves the guardian from `Running`
//! to `Draining`: the fault is reported, the listening server (if attached)
//! gets a bounded chance to close, and the process exits with status 1.
//! There is no way back to `Running`.

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::event::{FaultEventKind, FaultReport, ProcessFaultEvent};
use super::server::ListeningServer;
use crate::config::GuardianSettings;
use crate::error::{AppError, Result};
use crate::jobs::Cancellation;

static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Lifecycle of the process as seen by the guardian
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuardianState {
    Running,
    Draining,
    Terminated,
}

/// Ends the process
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: i32);
}

/// Terminator used in production
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Guardian configuration
#[derive(Debug, Clone)]
pub struct GuardianConfig {
    /// Upper bound on waiting for the server to close
    pub drain_timeout: Duration,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            drain_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&GuardianSettings> for GuardianConfig {
    fn from(settings: &GuardianSettings) -> Self {
        Self {
            drain_timeout: Duration::from_millis(settings.drain_timeout_ms),
        }
    }
}

#[derive(Serialize)]
struct StructuredReport<'a> {
    #[serde(rename = "type")]
    kind: String,
    name: &'a str,
    message: &'a str,
    stack: &'a str,
}

pub struct ProcessGuardian {
    config: GuardianConfig,
    terminator: Arc<dyn Terminator>,
    state: watch::Sender<GuardianState>,
    shutdown: watch::Sender<bool>,
    server: RwLock<Option<Arc<dyn ListeningServer>>>,
    events_tx: mpsc::UnboundedSender<ProcessFaultEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ProcessFaultEvent>>>,
}

impl ProcessGuardian {
    /// Create a guardian. Nothing is hooked up until [`install`](Self::install)
    /// or [`start`](Self::start) is called.
    pub fn new(config: GuardianConfig, terminator: Arc<dyn Terminator>) -> Arc<Self> {
        let (state, _) = watch::channel(GuardianState::Running);
        let (shutdown, _) = watch::channel(false);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Arc::new(Self {
            config,
            terminator,
            state,
            shutdown,
            server: RwLock::new(None),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        })
    }

    /// Install the process-wide panic hook and start the event loop.
    ///
    /// May only succeed once per process.
    pub fn install(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        if HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
            return Err(AppError::Internal(
                "process guardian is already installed".to_string(),
            ));
        }

        let guardian = Arc::clone(self);
        std::panic::set_hook(Box::new(move |info| {
            let location = info.location().map(|l| l.to_string());
            let report = FaultReport::from_panic(info.payload(), location);
            guardian.emit(FaultEventKind::UncaughtException, report);
        }));

        info!("Process guardian installed");
        Ok(self.start())
    }

    /// Start the event loop without touching the panic hook
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let events_rx = self.events_rx.lock().take();
        let guardian = Arc::clone(self);

        tokio::spawn(async move {
            let Some(mut events_rx) = events_rx else {
                warn!("Guardian event loop is already running");
                return;
            };

            while let Some(event) = events_rx.recv().await {
                guardian.handle(event).await;
            }
        })
    }

    /// Attach the listening server. Faults emitted from now on close it
    /// before exiting.
    pub fn attach_server(&self, server: Arc<dyn ListeningServer>) {
        *self.server.write() = Some(server);
        debug!("Listening server attached to guardian");
    }

    /// Queue a fault for the event loop. Safe to call from a panic hook.
    pub fn emit(&self, kind: FaultEventKind, report: FaultReport) {
        let mut event = ProcessFaultEvent::new(kind, report);
        if let Some(server) = self.server.read().clone() {
            event = event.with_server(server);
        }

        if let Err(mpsc::error::SendError(event)) = self.events_tx.send(event) {
            // No loop to drain through; report inline and go.
            let _ = std::panic::catch_unwind(AssertUnwindSafe(|| report_fault(&event)));
            self.terminate();
        }
    }

    /// Run `task` in the background; an `Err` result is an unhandled failure.
    pub fn spawn_supervised<F>(self: &Arc<Self>, name: &'static str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let guardian = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = task.await {
                guardian.emit(
                    FaultEventKind::UnhandledRejection,
                    FaultReport::from_error(name, &e),
                );
            }
        })
    }

    /// Process one fault event. Only the first event does anything.
    pub async fn handle(&self, event: ProcessFaultEvent) {
        let entered = self.state.send_if_modified(|state| {
            if *state == GuardianState::Running {
                *state = GuardianState::Draining;
                true
            } else {
                false
            }
        });

        if !entered {
            warn!(
                target: "guardian",
                kind = %event.kind,
                message = %event.report.message,
                "Fault received while shutting down; ignoring"
            );
            return;
        }

        self.shutdown.send_replace(true);

        if std::panic::catch_unwind(AssertUnwindSafe(|| report_fault(&event))).is_err() {
            warn!(target: "guardian", "Fault report could not be written");
        }

        if let Some(server) = &event.server {
            info!(target: "guardian", "Closing listening server");
            let close = AssertUnwindSafe(server.close()).catch_unwind();
            match tokio::time::timeout(self.config.drain_timeout, close).await {
                Ok(Ok(())) => info!(target: "guardian", "Listening server closed"),
                Ok(Err(_)) => warn!(target: "guardian", "Listening server panicked while closing"),
                Err(_) => warn!(
                    target: "guardian",
                    timeout_ms = self.config.drain_timeout.as_millis() as u64,
                    "Listening server did not close in time"
                ),
            }
        }

        self.terminate();
    }

    fn terminate(&self) {
        self.state.send_replace(GuardianState::Terminated);
        self.terminator.terminate(1);
    }

    pub fn state(&self) -> GuardianState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == GuardianState::Running
    }

    /// Fires when the guardian starts draining
    pub fn cancellation(&self) -> Cancellation {
        Cancellation::new(self.shutdown.subscribe())
    }

    /// Resolves once the guardian has terminated
    pub async fn terminated(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == GuardianState::Terminated).await;
    }
}

fn report_fault(event: &ProcessFaultEvent) {
    let report = StructuredReport {
        kind: event.kind.to_string(),
        name: &event.report.name,
        message: &event.report.message,
        stack: &event.report.stack,
    };

    error!(target: "guardian", "{}", event.kind.operator_message());
    error!(
        target: "guardian",
        report = %serde_json::to_string(&report).unwrap_or_default(),
        "Process fault"
    );
}
