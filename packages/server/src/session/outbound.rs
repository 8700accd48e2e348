//! Write side of a session: outbound queue in, socket frames out.

use std::{fmt::Display, time::Duration};

use axum::{body::Bytes, extract::ws::Message as WsMessage};
use futures_util::{Sink, SinkExt};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::{
    hub::OutboundQueue,
    infrastructure::codec::{self, Frame},
};

use super::PumpExit;

#[derive(Debug, Clone, Copy)]
pub(crate) struct OutboundSettings {
    /// Deadline for each individual write
    pub(crate) write_timeout: Duration,
    /// Idle time after which a ping is sent
    pub(crate) ping_period: Duration,
}

/// Drain the outbound queue into the socket.
///
/// Frames already waiting when a write starts are coalesced into one text
/// frame, separated by newlines. A ping goes out whenever the connection has
/// been idle for a full ping period. Ends when the hub closes the queue or a
/// write fails or stalls.
pub(crate) async fn write_pump<S>(
    mut sink: S,
    mut queue: OutboundQueue,
    settings: OutboundSettings,
) -> PumpExit
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    let mut ticker = time::interval_at(
        Instant::now() + settings.ping_period,
        settings.ping_period,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = queue.pop() => {
                let Some(first) = frame else {
                    // Best effort; the peer may already be gone.
                    let _ = write(&mut sink, WsMessage::Close(None), settings.write_timeout).await;
                    return PumpExit::QueueClosed;
                };
                let batch = drain_batch(first, &mut queue);
                if let Err(exit) = write(&mut sink, WsMessage::Text(batch.into()), settings.write_timeout).await {
                    return exit;
                }
                ticker.reset();
            }
            _ = ticker.tick() => {
                if let Err(exit) = write(&mut sink, WsMessage::Ping(Bytes::new()), settings.write_timeout).await {
                    return exit;
                }
            }
        }
    }
}

fn drain_batch(first: Frame, queue: &mut OutboundQueue) -> String {
    let mut frames = vec![first];
    while let Some(next) = queue.try_pop() {
        frames.push(next);
    }
    codec::join_batch(&frames)
}

async fn write<S>(sink: &mut S, message: WsMessage, deadline: Duration) -> Result<(), PumpExit>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    match time::timeout(deadline, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(PumpExit::WriteError(e.to_string())),
        Err(_) => Err(PumpExit::WriteTimeout),
    }
}
