//! Trailing-edge debouncing.
//!
//! Every call restarts the quiet window. When the window elapses without
//! another call, the latest value is delivered on the output channel and
//! earlier values are discarded.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;

enum Command<T> {
    Call(T),
    Cancel,
    Flush,
}

/// Handle for feeding values into a debounce task.
///
/// Dropping every handle stops the task and discards a pending value.
#[derive(Debug)]
pub struct Debouncer<T> {
    commands: mpsc::UnboundedSender<Command<T>>,
    wait: Duration,
}

impl<T> Clone for Debouncer<T> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            wait: self.wait,
        }
    }
}

/// Spawns a debounce task with the given quiet window.
///
/// Returns the input handle and the channel values come out of.
pub fn debounce<T: Send + 'static>(wait: Duration) -> (Debouncer<T>, mpsc::UnboundedReceiver<T>) {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (output_tx, output_rx) = mpsc::unbounded_channel();

    tokio::spawn(run(wait, commands_rx, output_tx));

    (
        Debouncer {
            commands: commands_tx,
            wait,
        },
        output_rx,
    )
}

impl<T> Debouncer<T> {
    /// Replaces the pending value and restarts the window.
    pub fn call(&self, value: T) {
        let _ = self.commands.send(Command::Call(value));
    }

    /// Drops the pending value, if any.
    pub fn cancel(&self) {
        let _ = self.commands.send(Command::Cancel);
    }

    /// Delivers the pending value now.
    pub fn flush(&self) {
        let _ = self.commands.send(Command::Flush);
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// True once the debounce task has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

async fn run<T>(
    wait: Duration,
    mut commands: mpsc::UnboundedReceiver<Command<T>>,
    output: mpsc::UnboundedSender<T>,
) {
    let mut pending: Option<T> = None;
    let timer = tokio::time::sleep(wait);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Call(value)) => {
                    pending = Some(value);
                    timer.as_mut().reset(Instant::now() + wait);
                }
                Some(Command::Cancel) => {
                    pending = None;
                }
                Some(Command::Flush) => {
                    if let Some(value) = pending.take() {
                        if output.send(value).is_err() {
                            break;
                        }
                    }
                }
                None => break,
            },
            () = &mut timer, if pending.is_some() => {
                if let Some(value) = pending.take() {
                    trace!("debounce window elapsed");
                    if output.send(value).is_err() {
                        break;
                    }
                }
            }
        }
    }
}
