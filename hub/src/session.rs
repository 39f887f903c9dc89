use crate::registry::{ConnectionId, SessionHandle};
use crate::{Hub, Payload, RecipientId, SessionConfig};
use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use log::*;
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Why a session stopped. Sessions never report errors to a caller; the
/// reason is only logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The outbound queue was closed by unregister or slow-consumer eviction.
    QueueClosed,
    WriteFailed(String),
    WriteTimeout,
    PeerClosed,
    ReadFailed(String),
    /// No frame from the peer within the pong wait.
    LivenessTimeout,
    MessageTooLarge(usize),
}

/// One live streaming connection belonging to a recipient.
///
/// A session runs two pumps side by side: the outbound pump drains the
/// session's queue into the transport and sends pings, the inbound pump
/// watches the transport for liveness and close. Whichever stops first stops
/// the other, then the session unregisters itself exactly once.
#[derive(Debug)]
pub struct Session {
    pub id: ConnectionId,
    pub recipient_id: RecipientId,
    pub(crate) outbound: mpsc::Receiver<Payload>,
    config: SessionConfig,
}

impl Session {
    /// Create a session and the handle the registry keeps for it.
    pub fn new(recipient_id: RecipientId, config: &SessionConfig) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(config.outbound_queue_capacity);
        let id = ConnectionId::new();

        let handle = SessionHandle {
            id,
            recipient_id,
            outbound: tx,
        };
        let session = Self {
            id,
            recipient_id,
            outbound: rx,
            config: config.clone(),
        };

        (session, handle)
    }

    /// Pump frames between the transport halves and the session's queue until
    /// either side gives up, then unregister from the hub.
    pub async fn run<S, R, E>(self, sink: S, stream: R, hub: Hub) -> SessionEnd
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let Session {
            id,
            recipient_id,
            outbound,
            config,
        } = self;

        let end = tokio::select! {
            end = outbound_pump(sink, outbound, &config) => end,
            end = inbound_pump(stream, &config) => end,
        };

        match &end {
            SessionEnd::QueueClosed | SessionEnd::PeerClosed => {
                debug!("Connection {id} for user {recipient_id} closed: {end:?}")
            }
            _ => warn!("Connection {id} for user {recipient_id} terminated: {end:?}"),
        }

        hub.unregister(recipient_id, id).await;
        end
    }
}

async fn outbound_pump<S>(
    mut sink: S,
    mut queue: mpsc::Receiver<Payload>,
    config: &SessionConfig,
) -> SessionEnd
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut ping = time::interval_at(Instant::now() + config.ping_interval, config.ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            next = queue.recv() => match next {
                Some(first) => {
                    let frame = coalesce(first, &mut queue);
                    if let Err(end) = write(&mut sink, Message::Text(frame), config).await {
                        return end;
                    }
                }
                None => {
                    // Best effort; the peer may already be gone.
                    let _ = write(&mut sink, Message::Close(None), config).await;
                    return SessionEnd::QueueClosed;
                }
            },
            _ = ping.tick() => {
                if let Err(end) = write(&mut sink, Message::Ping(Vec::new()), config).await {
                    return end;
                }
            }
        }
    }
}

/// Join the first payload with everything already waiting in the queue,
/// newline-delimited, preserving queue order.
fn coalesce(first: Payload, queue: &mut mpsc::Receiver<Payload>) -> String {
    let mut frame = String::from(&*first);
    while let Ok(next) = queue.try_recv() {
        frame.push('\n');
        frame.push_str(&next);
    }
    frame
}

async fn write<S>(sink: &mut S, message: Message, config: &SessionConfig) -> Result<(), SessionEnd>
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    match time::timeout(config.write_wait, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SessionEnd::WriteFailed(e.to_string())),
        Err(_) => Err(SessionEnd::WriteTimeout),
    }
}

async fn inbound_pump<R, E>(mut stream: R, config: &SessionConfig) -> SessionEnd
where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    loop {
        let Ok(next) = time::timeout(config.pong_wait, stream.next()).await else {
            return SessionEnd::LivenessTimeout;
        };

        match next {
            None | Some(Ok(Message::Close(_))) => return SessionEnd::PeerClosed,
            Some(Err(e)) => return SessionEnd::ReadFailed(e.to_string()),
            Some(Ok(Message::Pong(_))) | Some(Ok(Message::Ping(_))) => {
                trace!("Liveness acknowledged");
            }
            Some(Ok(Message::Text(text))) => {
                if text.len() > config.max_message_bytes {
                    return SessionEnd::MessageTooLarge(text.len());
                }
                trace!("Ignoring inbound text frame: {text}");
            }
            Some(Ok(Message::Binary(data))) => {
                if data.len() > config.max_message_bytes {
                    return SessionEnd::MessageTooLarge(data.len());
                }
                trace!("Ignoring inbound binary frame of {} bytes", data.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{channel, HubConfig};
    use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
    use std::time::Duration;
    use tokio::task::JoinHandle;

    type Inbound = UnboundedSender<Result<Message, String>>;

    struct Harness {
        hub: Hub,
        handle: SessionHandle,
        written: UnboundedReceiver<Message>,
        inbound: Inbound,
        task: JoinHandle<SessionEnd>,
    }

    async fn start(config: SessionConfig) -> Harness {
        let (hub, dispatch) = channel(&HubConfig::default());
        tokio::spawn(dispatch.run());

        let (session, handle) = Session::new(uuid::Uuid::new_v4(), &config);
        hub.register(handle.clone()).await.unwrap();

        let (sink, written) = unbounded::<Message>();
        let (inbound, stream) = unbounded::<Result<Message, String>>();
        let task = tokio::spawn(session.run(sink, stream, hub.clone()));

        Harness {
            hub,
            handle,
            written,
            inbound,
            task,
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn queued_payloads_are_coalesced_in_order() {
        let (session, handle) = Session::new(uuid::Uuid::new_v4(), &SessionConfig::default());
        for payload in ["a", "b", "c"] {
            assert_eq!(handle.try_enqueue(&Payload::from(payload)), crate::registry::Enqueue::Queued);
        }

        let (hub, dispatch) = channel(&HubConfig::default());
        tokio::spawn(dispatch.run());
        let (sink, mut written) = unbounded::<Message>();
        let (_inbound, stream) = unbounded::<Result<Message, String>>();
        tokio::spawn(session.run(sink, stream, hub));

        assert_eq!(written.next().await, Some(Message::Text("a\nb\nc".to_string())));
    }

    #[tokio::test]
    async fn closed_queue_sends_close_frame_and_unregisters() {
        let mut harness = start(SessionConfig::default()).await;
        let recipient = harness.handle.recipient_id;
        assert_eq!(harness.hub.connection_count(recipient).await, 1);

        // Unregister drops the registry's sender; the local clone goes too.
        harness.hub.unregister(recipient, harness.handle.id).await;
        drop(harness.handle);

        assert_eq!(harness.task.await.unwrap(), SessionEnd::QueueClosed);
        assert_eq!(harness.written.next().await, Some(Message::Close(None)));
        assert_eq!(harness.hub.connection_count(recipient).await, 0);
    }

    #[tokio::test]
    async fn peer_close_stops_both_pumps_and_unregisters() {
        let mut harness = start(SessionConfig::default()).await;
        let recipient = harness.handle.recipient_id;
        drop(harness.handle);

        harness.inbound.unbounded_send(Ok(Message::Close(None))).unwrap();

        assert_eq!(harness.task.await.unwrap(), SessionEnd::PeerClosed);
        // The outbound half was dropped with the pump.
        assert_eq!(harness.written.next().await, None);
        assert_eq!(harness.hub.connection_count(recipient).await, 0);
    }

    #[tokio::test]
    async fn read_error_terminates_the_session() {
        let harness = start(SessionConfig::default()).await;

        harness
            .inbound
            .unbounded_send(Err("connection reset".to_string()))
            .unwrap();

        assert_eq!(
            harness.task.await.unwrap(),
            SessionEnd::ReadFailed("connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn oversized_inbound_frame_terminates_the_session() {
        let config = SessionConfig {
            max_message_bytes: 8,
            ..SessionConfig::default()
        };
        let harness = start(config).await;

        harness
            .inbound
            .unbounded_send(Ok(Message::Text("x".repeat(9))))
            .unwrap();

        assert_eq!(harness.task.await.unwrap(), SessionEnd::MessageTooLarge(9));
    }

    #[tokio::test]
    async fn inbound_text_is_ignored() {
        let mut harness = start(SessionConfig::default()).await;

        harness
            .inbound
            .unbounded_send(Ok(Message::Text("ack".to_string())))
            .unwrap();
        settle().await;
        assert!(!harness.task.is_finished());

        harness.handle.try_enqueue(&Payload::from("still here"));
        assert_eq!(
            harness.written.next().await,
            Some(Message::Text("still here".to_string()))
        );
    }

    #[tokio::test]
    async fn write_failure_terminates_and_unregisters() {
        let harness = start(SessionConfig::default()).await;
        let recipient = harness.handle.recipient_id;
        drop(harness.written);

        harness.handle.try_enqueue(&Payload::from("into the void"));

        assert!(matches!(
            harness.task.await.unwrap(),
            SessionEnd::WriteFailed(_)
        ));
        assert_eq!(harness.hub.connection_count(recipient).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pings_on_interval_and_times_out_without_acknowledgement() {
        let mut harness = start(SessionConfig::default()).await;

        // Paused clock auto-advances to the first ping.
        assert_eq!(harness.written.next().await, Some(Message::Ping(Vec::new())));

        assert_eq!(harness.task.await.unwrap(), SessionEnd::LivenessTimeout);
    }

    #[tokio::test(start_paused = true)]
    async fn pong_keeps_the_session_alive() {
        let harness = start(SessionConfig::default()).await;

        time::advance(Duration::from_secs(50)).await;
        harness
            .inbound
            .unbounded_send(Ok(Message::Pong(Vec::new())))
            .unwrap();
        settle().await;

        time::advance(Duration::from_secs(50)).await;
        settle().await;
        assert!(!harness.task.is_finished());

        time::advance(Duration::from_secs(11)).await;
        assert_eq!(harness.task.await.unwrap(), SessionEnd::LivenessTimeout);
    }
}
