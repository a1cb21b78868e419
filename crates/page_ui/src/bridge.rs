//! Bridge between the single-threaded page side and the persistence worker.
//!
//! The page queues [`BackendCommand`]s on a bounded channel; a worker thread
//! owning a tokio runtime spawns one task per submission and reports back as
//! [`UiEvent`]s, which the page drains at its own pace.

use std::{sync::Arc, thread};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use tracing::{debug, error, info};

use crate::{
    config::UiConfig,
    persistence::{HttpThemePersistence, PersistError, ThemePersistence},
    preferences::PersistRequest,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    PersistTheme(PersistRequest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Info(String),
    ThemePersisted(PersistRequest),
    ThemePersistFailed {
        request: PersistRequest,
        error: PersistError,
    },
    WorkerFailed(String),
}

/// Page-side ends of the two queues.
pub struct BackendLink {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
}

impl BackendLink {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self { cmd_tx, ui_rx }
    }

    pub fn events(&self) -> &Receiver<UiEvent> {
        &self.ui_rx
    }

    pub fn dispatch(&self, cmd: BackendCommand) -> Result<(), PersistError> {
        dispatch_backend_command(&self.cmd_tx, cmd)
    }
}

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), PersistError> {
    let cmd_name = match &cmd {
        BackendCommand::PersistTheme(_) => "persist_theme",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            debug!(command = cmd_name, "queued page->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err(PersistError::Unavailable(
            "command queue is full".to_string(),
        )),
        Err(TrySendError::Disconnected(_)) => Err(PersistError::Unavailable(
            "persistence worker stopped".to_string(),
        )),
    }
}

/// Starts the worker thread and returns the page-side link. Commands are
/// bounded by `capacity`; outcomes are never dropped.
pub fn launch(persistence: Arc<dyn ThemePersistence>, capacity: usize) -> BackendLink {
    let (cmd_tx, cmd_rx) = bounded(capacity);
    let (ui_tx, ui_rx) = unbounded();
    start_persistence_worker(persistence, cmd_rx, ui_tx);
    BackendLink::new(cmd_tx, ui_rx)
}

/// Worker posting to the configured HTTP endpoint.
pub fn launch_http(config: &UiConfig) -> Result<BackendLink, PersistError> {
    let endpoint = config
        .endpoint_url()
        .map_err(|err| PersistError::Unavailable(err.to_string()))?;
    let mut persistence = HttpThemePersistence::new(endpoint, config.request_timeout())?;
    if let Some(cookie) = &config.session_cookie {
        persistence = persistence.with_session_cookie(cookie.clone());
    }
    Ok(launch(
        Arc::new(persistence),
        config.command_queue_capacity.max(1),
    ))
}

pub fn start_persistence_worker(
    persistence: Arc<dyn ThemePersistence>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::WorkerFailed(format!(
                    "failed to build persistence runtime: {err}"
                )));
                error!("failed to build persistence runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let _ = ui_tx.try_send(UiEvent::Info("persistence worker ready".to_string()));
            info!("persistence worker ready");

            let mut in_flight = Vec::new();
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::PersistTheme(request) => {
                        let persistence = persistence.clone();
                        let ui_tx = ui_tx.clone();
                        in_flight.retain(|task: &tokio::task::JoinHandle<()>| !task.is_finished());
                        in_flight.push(tokio::spawn(async move {
                            let event = match persistence.submit(request.theme).await {
                                Ok(()) => UiEvent::ThemePersisted(request),
                                Err(error) => UiEvent::ThemePersistFailed { request, error },
                            };
                            if ui_tx.send(event).is_err() {
                                debug!(seq = request.seq, "page gone before theme outcome arrived");
                            }
                        }));
                    }
                }
            }

            for task in in_flight {
                let _ = task.await;
            }
            debug!("persistence worker stopped");
        });
    })
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
