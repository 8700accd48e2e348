//! Client execution logic with reconnection support.

use std::time::Duration;

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use super::{
    error::ClientError,
    session::{SessionEnd, run_client_session},
    ui::PROMPT,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 10;
const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Exponential reconnect schedule: 1 s, doubling, capped at 30 s, ten attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    attempt: u32,
    initial: Duration,
    max_delay: Duration,
    max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(INITIAL_RECONNECT_DELAY, MAX_RECONNECT_DELAY, MAX_RECONNECT_ATTEMPTS)
    }
}

impl Backoff {
    pub fn new(initial: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempt: 0,
            initial,
            max_delay,
            max_attempts,
        }
    }

    /// Delay before the next attempt, or `None` once attempts are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(self.attempt);
        self.attempt += 1;
        Some(self.initial.saturating_mul(factor).min(self.max_delay))
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Start over after a connection was established.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Run the client, reconnecting until the user exits or attempts run out
pub async fn run_client(url: String, token: String) -> Result<(), ClientError> {
    let mut input = spawn_readline();
    let mut backoff = Backoff::default();

    loop {
        tracing::info!("Connecting to {}", url);

        let reason = match run_client_session(&url, &token, &mut input).await {
            Ok(SessionEnd::UserExit) => {
                tracing::info!("Client session ended normally");
                return Ok(());
            }
            Ok(SessionEnd::Lost(reason)) => {
                backoff.reset();
                reason
            }
            Err(e @ ClientError::Unauthorized(_)) => {
                tracing::error!("{}", e);
                return Err(e);
            }
            Err(e) => e.to_string(),
        };

        tracing::warn!("Connection lost: {}", reason);
        let Some(delay) = backoff.next_delay() else {
            tracing::error!(
                "Failed to reconnect after {} attempts. Exiting.",
                MAX_RECONNECT_ATTEMPTS
            );
            return Err(ClientError::RetriesExhausted(MAX_RECONNECT_ATTEMPTS));
        };

        tracing::info!(
            "Reconnecting in {:?}... (attempt {}/{})",
            delay,
            backoff.attempts(),
            MAX_RECONNECT_ATTEMPTS
        );
        tokio::time::sleep(delay).await;
    }
}

/// Read lines on a blocking thread and forward them to the async side.
///
/// The thread outlives individual sessions so input keeps working across
/// reconnects. The channel closes on Ctrl+C or Ctrl+D.
fn spawn_readline() -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}
