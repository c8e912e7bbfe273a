use crate::core::Page;
use crate::engine::machine::Engine;
use crate::engine::reporter::StatusSink;
use crate::errors::{AutomatorError, Result};
use crate::types::{Command, Reply, StartRequest, StatusSnapshot};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

const COMMAND_BUFFER: usize = 32;

struct Envelope {
    command: Command,
    reply: oneshot::Sender<StatusSnapshot>,
}

/// Client side of a running engine task.
pub struct EngineHandle<P: Page + 'static, S: StatusSink + 'static> {
    commands: mpsc::Sender<Envelope>,
    task: JoinHandle<Engine<P, S>>,
}

/// Moves the engine onto its own task. Commands and timer firings are
/// handled one at a time, in arrival order.
pub fn spawn<P, S>(engine: Engine<P, S>) -> EngineHandle<P, S>
where
    P: Page + 'static,
    S: StatusSink + 'static,
{
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let task = tokio::spawn(drive(engine, receiver));
    EngineHandle { commands, task }
}

async fn drive<P, S>(
    mut engine: Engine<P, S>,
    mut receiver: mpsc::Receiver<Envelope>,
) -> Engine<P, S>
where
    P: Page + 'static,
    S: StatusSink + 'static,
{
    let started = Instant::now();
    let origin = started
        .checked_sub(Duration::from_millis(engine.now()))
        .unwrap_or(started);

    loop {
        let deadline = engine
            .next_deadline()
            .map(|ms| origin + Duration::from_millis(ms));

        tokio::select! {
            envelope = receiver.recv() => {
                let Some(envelope) = envelope else {
                    break;
                };
                engine.advance_to(elapsed_ms(origin)).await;
                let status = engine.handle(envelope.command).await;
                // The caller may have stopped waiting for the reply.
                let _ = envelope.reply.send(status);
            }
            _ = sleep_until_deadline(deadline) => {
                engine.advance_to(elapsed_ms(origin)).await;
            }
        }
    }

    tracing::debug!("engine task shutting down");
    engine
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

fn elapsed_ms(origin: Instant) -> u64 {
    origin.elapsed().as_millis() as u64
}

impl<P: Page + 'static, S: StatusSink + 'static> EngineHandle<P, S> {
    pub async fn send(&self, command: Command) -> Result<StatusSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .await
            .map_err(|_| AutomatorError::EngineStopped)?;
        response.await.map_err(|_| AutomatorError::EngineStopped)
    }

    /// Raw panel message in, `{ "status": ... }` out.
    pub async fn send_message(&self, message: Value) -> Result<Reply> {
        let status = self.send(Command::from_message(message)).await?;
        Ok(Reply { status })
    }

    pub async fn start(&self, request: StartRequest) -> Result<StatusSnapshot> {
        self.send(Command::Start(request)).await
    }

    pub async fn stop(&self) -> Result<StatusSnapshot> {
        self.send(Command::Stop).await
    }

    pub async fn resume(&self) -> Result<StatusSnapshot> {
        self.send(Command::Resume).await
    }

    pub async fn cancel(&self) -> Result<StatusSnapshot> {
        self.send(Command::Cancel).await
    }

    pub async fn status(&self) -> Result<StatusSnapshot> {
        self.send(Command::StatusRequest).await
    }

    /// Stops the task and hands the engine back.
    pub async fn shutdown(self) -> Result<Engine<P, S>> {
        drop(self.commands);
        self.task.await.map_err(|_| AutomatorError::EngineStopped)
    }
}
