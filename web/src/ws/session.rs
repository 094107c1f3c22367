use axum::body::Bytes;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use hub::connection::{CloseSignal, OutboundReceiver, UserId};
use hub::lifecycle::ConnectionState;
use hub::message::{BroadcastEvent, Topic};
use hub::Hub;
use log::*;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

/// What a live connection does with data frames its client sends.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Inbound {
    /// Rebroadcast every text/binary frame to this topic.
    Relay(Topic),
    /// Read only to notice the peer going away.
    Discard,
}

/// Why the writer pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriterExit {
    /// The hub closed the outbound queue and every queued payload was written.
    QueueClosed,
    /// Writing to the socket failed; remaining payloads were abandoned.
    TransportError,
}

/// One upgraded socket from registration to close.
pub(crate) struct Session {
    hub: Arc<Hub>,
    user_id: UserId,
    topics: Vec<Topic>,
    inbound: Inbound,
    state: watch::Sender<ConnectionState>,
}

impl Session {
    pub(crate) fn new(hub: Arc<Hub>, user_id: UserId, topics: Vec<Topic>, inbound: Inbound) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self {
            hub,
            user_id,
            topics,
            inbound,
            state,
        }
    }

    /// Observe lifecycle transitions of this session.
    pub(crate) fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub(crate) async fn run(self, socket: WebSocket) {
        let (sink, stream) = socket.split();
        self.serve(sink, stream).await
    }

    /// Register with the hub, then pump frames both ways until either side
    /// ends. Always leaves the connection unregistered and the state `Closed`.
    ///
    /// The session enters `Draining` as soon as the outbound queue is closed,
    /// whoever closed it, and stays there until the writer has flushed what
    /// was still queued.
    pub(crate) async fn serve<S, R, E>(self, mut sink: S, mut stream: R)
    where
        S: Sink<Message> + Unpin + Send + 'static,
        S::Error: Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let registration = self
            .hub
            .register_connection(self.user_id.clone(), self.topics.clone());

        let (connection_id, outbound) = match registration {
            Ok(registered) => registered,
            Err(e) => {
                warn!("Refusing connection for user {:?}: {e}", self.user_id);
                let refusal = Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: "invalid connection".into(),
                }));
                if let Err(e) = sink.send(refusal).await {
                    trace!("Close frame for user {:?} not sent: {e}", self.user_id);
                }
                self.advance(ConnectionState::Closed);
                return;
            }
        };
        // `None` means dispatch already evicted it; the loop exits at once.
        let mut queue_closed = self.hub.watch_close(&connection_id);
        self.advance(ConnectionState::Registered);

        let mut writer = tokio::spawn(write_pump(sink, outbound));
        let mut writer_exit = None;
        let mut reader_open = true;

        loop {
            tokio::select! {
                biased;

                _ = close_signal(&mut queue_closed) => {
                    debug!(
                        "Outbound queue for connection {} closed by the hub",
                        connection_id.as_str()
                    );
                    break;
                }
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.relay(text.into_bytes()),
                    Some(Ok(Message::Binary(data))) => self.relay(data),
                    Some(Ok(Message::Close(frame))) => {
                        debug!("User {} closed connection: {frame:?}", self.user_id);
                        reader_open = false;
                        break;
                    }
                    // Ping/pong is answered by the protocol layer
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Read error for user {}: {e}", self.user_id);
                        reader_open = false;
                        break;
                    }
                    None => {
                        reader_open = false;
                        break;
                    }
                },
                exit = &mut writer => {
                    writer_exit = Some(exit);
                    break;
                }
            }
        }

        // No-op if dispatch already evicted this connection.
        self.hub.unregister_connection(&connection_id);
        self.advance(ConnectionState::Draining);

        let exit = match writer_exit {
            Some(exit) => exit,
            None => finish_writer(&mut writer, &mut stream, reader_open).await,
        };
        match exit {
            Ok(WriterExit::QueueClosed) => debug!(
                "Writer drained for connection {}",
                connection_id.as_str()
            ),
            Ok(WriterExit::TransportError) => debug!(
                "Writer stopped on transport error for connection {}",
                connection_id.as_str()
            ),
            Err(e) if e.is_cancelled() => debug!(
                "Writer for connection {} abandoned, peer went away while draining",
                connection_id.as_str()
            ),
            Err(e) => error!(
                "Writer task for connection {} failed: {e}",
                connection_id.as_str()
            ),
        }
        self.advance(ConnectionState::Closed);
    }

    fn relay(&self, data: Vec<u8>) {
        if let Inbound::Relay(topic) = &self.inbound {
            self.hub.dispatch(BroadcastEvent::new(topic.clone(), data));
        }
    }

    fn advance(&self, next: ConnectionState) {
        let previous = *self.state.borrow();
        let mut outcome = Ok(());
        self.state
            .send_if_modified(|state| match state.transition(next) {
                Ok(()) => true,
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            });
        match outcome {
            Ok(()) => trace!("Connection for user {}: {previous} -> {next}", self.user_id),
            Err(e) => warn!("Connection for user {}: {e}", self.user_id),
        }
    }
}

/// Resolves once the hub has closed the queue; immediately if it already had.
async fn close_signal(queue_closed: &mut Option<CloseSignal>) {
    if let Some(signal) = queue_closed {
        // Only ever resolves with `Err`: the registry drops the sender.
        let _ = signal.await;
    }
}

/// Wait for the writer to flush the closed queue. If the peer goes away in
/// the meantime nobody is left to read, so the writer is abandoned.
async fn finish_writer<R, E>(
    writer: &mut JoinHandle<WriterExit>,
    stream: &mut R,
    mut reader_open: bool,
) -> Result<WriterExit, JoinError>
where
    R: Stream<Item = Result<Message, E>> + Unpin,
{
    loop {
        tokio::select! {
            exit = &mut *writer => return exit,
            frame = stream.next(), if reader_open => match frame {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => {
                    writer.abort();
                    reader_open = false;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

/// Drain the outbound queue onto the socket until the hub closes it.
pub(crate) async fn write_pump<S>(mut sink: S, mut outbound: OutboundReceiver) -> WriterExit
where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = sink.send(into_frame(payload)).await {
            debug!("Socket write failed: {e}");
            return WriterExit::TransportError;
        }
    }

    let goodbye = Message::Close(Some(CloseFrame {
        code: close_code::NORMAL,
        reason: "".into(),
    }));
    if let Err(e) = sink.send(goodbye).await {
        trace!("Close frame not sent: {e}");
    }
    WriterExit::QueueClosed
}

/// JSON payloads go out as text frames; anything that is not UTF-8 as binary.
pub(crate) fn into_frame(payload: Bytes) -> Message {
    match String::from_utf8(payload.to_vec()) {
        Ok(text) => Message::Text(text),
        Err(e) => Message::Binary(e.into_bytes()),
    }
}
