//! Request dispatch controller.
//!
//! Receives generation commands from the UI thread, runs each collaborator call as
//! its own task and emits completions back for the owning surface to judge.

use crate::engine::Generator;
use crate::model::{AppEvent, Completion, GenerationRequest, InfoEvent};
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Generate(GenerationRequest),
    Quit,
}

/// Run one collaborator call and report its completion.
fn spawn_generation(
    generator: Arc<dyn Generator>,
    req: GenerationRequest,
    event_tx: UnboundedSender<AppEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        let outcome = generator.generate(&req.prompt).await;
        tracing::debug!(
            surface = ?req.surface,
            token = %req.token,
            ok = outcome.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "collaborator call finished"
        );
        let _ = event_tx.send(AppEvent::Completed(Completion {
            surface: req.surface,
            token: req.token,
            failure_context: req.failure_context,
            outcome,
        }));
    })
}

/// Dispatch generation commands until the UI quits or hangs up.
///
/// Superseded requests are never aborted; their completions are still sent and the
/// surface drops them.
pub(crate) async fn run_controller(
    generator: Arc<dyn Generator>,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut in_flight = Vec::new();

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            UiCommand::Generate(req) => {
                let _ = event_tx.send(AppEvent::Info(InfoEvent::Dispatched {
                    surface: req.surface,
                    token: req.token,
                }));
                in_flight.retain(|h: &tokio::task::JoinHandle<()>| !h.is_finished());
                in_flight.push(spawn_generation(generator.clone(), req, event_tx.clone()));
                tracing::trace!(in_flight = in_flight.len(), "request dispatched");
            }
            UiCommand::Quit => break,
        }
    }

    // Pending calls are abandoned on quit.
    for handle in in_flight {
        handle.abort();
    }
    Ok(())
}
