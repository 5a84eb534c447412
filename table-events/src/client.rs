//! # Table Event Client
//!
//! A persistent WebSocket connection to the event server. A background task owns
//! the socket; [`EventClient`] handles talk to it over a command channel.
//!
//! Each subscription yields events lazily until it is unsubscribed or the
//! connection drops. There is no reconnection: once the socket closes every
//! subscription ends and events sent in the meantime are lost.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, Stream, StreamExt};
use log::{debug, error, info, warn};
use snafu::ResultExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::error::*;
use crate::protocol::{parse_frame, ClientMessage, ServerMessage, TableEvent};

/// Default address of the event server.
pub const DEFAULT_EVENT_URL: &str = "ws://localhost:8585/ws";

/// Socket type produced by the handshake.
type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventClientConfig {
    /// WebSocket endpoint.
    pub url: Url,
    /// Interval between keep-alive pings; `None` disables them.
    pub ping_interval: Option<Duration>,
    /// Capacity of the command channel to the connection task.
    pub channel_capacity: usize,
}

impl EventClientConfig {
    /// Settings for the server at `url`.
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url).context(InvalidUrlSnafu { url })?;
        Ok(Self {
            url,
            ..Self::default()
        })
    }
}

impl Default for EventClientConfig {
    fn default() -> Self {
        Self {
            // Constant literal, parsing cannot fail.
            url: Url::parse(DEFAULT_EVENT_URL).unwrap_or_else(|_| unreachable!()),
            ping_interval: Some(Duration::from_secs(30)),
            channel_capacity: 64,
        }
    }
}

/// Identifies one subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    /// Unique per client.
    id: u64,
    /// Table the subscription listens to.
    table_id: String,
}

impl SubscriptionHandle {
    /// Table the subscription listens to.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }
}

/// A live subscription delivering events in arrival order.
#[derive(Debug)]
pub struct Subscription {
    /// Used to unsubscribe.
    handle: SubscriptionHandle,
    /// Fed by the connection task.
    receiver: mpsc::UnboundedReceiver<TableEvent>,
}

impl Subscription {
    /// Handle to pass to [`EventClient::unsubscribe`].
    pub fn handle(&self) -> &SubscriptionHandle {
        &self.handle
    }

    /// Next event, or `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<TableEvent> {
        self.receiver.recv().await
    }

    /// The remaining events as a stream.
    pub fn into_stream(self) -> impl Stream<Item = TableEvent> + Send {
        let mut receiver = self.receiver;
        stream! {
            while let Some(event) = receiver.recv().await {
                yield event;
            }
        }
    }
}

/// Requests handled by the connection task.
#[derive(Debug)]
enum Command {
    /// Register a subscriber.
    Subscribe {
        /// Subscription id.
        id: u64,
        /// Table to follow.
        table_id: String,
        /// Where events go.
        sender: mpsc::UnboundedSender<TableEvent>,
    },
    /// Drop a subscriber.
    Unsubscribe {
        /// Subscription id.
        id: u64,
    },
    /// Send a ping now.
    Ping,
}

/// Handle to a connection with the event server.
///
/// Cloning is cheap; the connection closes when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct EventClient {
    /// Command channel to the connection task.
    commands: mpsc::Sender<Command>,
    /// Source of subscription ids.
    next_id: Arc<AtomicU64>,
}

impl EventClient {
    /// Opens the WebSocket and starts the connection task.
    pub async fn connect(config: EventClientConfig) -> Result<Self> {
        let url = config.url.to_string();
        info!("🔌 Connecting to event server {url}");
        let (socket, _) = connect_async(url.as_str())
            .await
            .context(ConnectSnafu { url: url.clone() })?;
        info!("✅ Connected to event server {url}");

        let (commands, receiver) = mpsc::channel(config.channel_capacity.max(1));
        tokio::spawn(run_connection(socket, receiver, config.ping_interval));

        Ok(Self {
            commands,
            next_id: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Whether the connection task is still running.
    pub fn is_connected(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Subscribes to `table_id` and returns the event sequence.
    pub async fn stream(&self, table_id: &str) -> Result<Subscription> {
        if table_id.trim().is_empty() {
            return InvalidTableIdSnafu { table_id }.fail();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();
        self.send(Command::Subscribe {
            id,
            table_id: table_id.to_string(),
            sender,
        })
        .await?;

        Ok(Subscription {
            handle: SubscriptionHandle {
                id,
                table_id: table_id.to_string(),
            },
            receiver,
        })
    }

    /// Subscribes to `table_id` and invokes `callback` for every event on a
    /// background task.
    pub async fn subscribe<F>(&self, table_id: &str, mut callback: F) -> Result<SubscriptionHandle>
    where
        F: FnMut(TableEvent) + Send + 'static,
    {
        let mut subscription = self.stream(table_id).await?;
        let handle = subscription.handle().clone();
        tokio::spawn(async move {
            while let Some(event) = subscription.next().await {
                callback(event);
            }
        });
        Ok(handle)
    }

    /// Ends a subscription. Its sequence terminates after events already
    /// delivered.
    pub async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()> {
        self.send(Command::Unsubscribe { id: handle.id }).await
    }

    /// Sends a ping; the pong is logged by the connection task.
    pub async fn ping(&self) -> Result<()> {
        self.send(Command::Ping).await
    }

    /// Queues a command for the connection task.
    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::ConnectionClosed)
    }
}

/// Subscribers of the connection, grouped by table.
#[derive(Default)]
struct Subscribers {
    /// Table and sender per subscription id.
    by_id: HashMap<u64, (String, mpsc::UnboundedSender<TableEvent>)>,
}

impl Subscribers {
    /// Whether any subscriber follows `table_id`.
    fn follows(&self, table_id: &str) -> bool {
        self.by_id.values().any(|(table, _)| table == table_id)
    }

    /// Delivers `event` and returns tables whose last subscriber went away.
    fn dispatch(&mut self, event: &TableEvent) -> Vec<String> {
        let mut gone = Vec::new();
        self.by_id.retain(|_, (table, sender)| {
            if *table != event.game_id {
                return true;
            }
            let open = sender.send(event.clone()).is_ok();
            if !open {
                gone.push(table.clone());
            }
            open
        });
        gone.sort();
        gone.dedup();
        gone.retain(|table| !self.follows(table));
        gone
    }
}

/// Serializes and writes one client message.
async fn write(sink: &mut SplitSink<Socket, Message>, message: &ClientMessage) -> Result<()> {
    let text = message.to_json()?;
    debug!("➡️ {text}");
    sink.send(Message::text(text))
        .await
        .map_err(|_| Error::ConnectionClosed)
}

/// Owns the socket until it closes or every client handle is dropped.
async fn run_connection(
    socket: Socket,
    mut commands: mpsc::Receiver<Command>,
    ping_interval: Option<Duration>,
) {
    let (mut sink, mut incoming): (SplitSink<Socket, Message>, SplitStream<Socket>) =
        socket.split();
    let mut subscribers = Subscribers::default();

    let period = ping_interval.unwrap_or(Duration::from_secs(3600));
    let mut ticker = interval_at(Instant::now() + period, period);

    loop {
        let outgoing = tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Subscribe { id, table_id, sender }) => {
                    let first = !subscribers.follows(&table_id);
                    subscribers.by_id.insert(id, (table_id.clone(), sender));
                    if first {
                        info!("📥 Subscribing to table {table_id}");
                        vec![ClientMessage::Subscribe { game_id: table_id }]
                    } else {
                        vec![]
                    }
                }
                Some(Command::Unsubscribe { id }) => match subscribers.by_id.remove(&id) {
                    Some((table_id, _)) if !subscribers.follows(&table_id) => {
                        info!("📤 Unsubscribing from table {table_id}");
                        vec![ClientMessage::Unsubscribe { game_id: table_id }]
                    }
                    _ => vec![],
                },
                Some(Command::Ping) => vec![ClientMessage::Ping],
                None => {
                    info!("Event client dropped, closing connection");
                    let _ = sink.close().await;
                    break;
                }
            },
            frame = incoming.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let mut outgoing = Vec::new();
                    for message in parse_frame(text.as_str()) {
                        match message {
                            Ok(ServerMessage::Event(event)) => {
                                debug!("📨 {} event for table {}", event.event, event.game_id);
                                for table_id in subscribers.dispatch(&event) {
                                    outgoing.push(ClientMessage::Unsubscribe { game_id: table_id });
                                }
                            }
                            Ok(ServerMessage::Pong) => debug!("🏓 pong"),
                            Err(err) => warn!("⚠️ Skipping unreadable server message: {err}"),
                        }
                    }
                    outgoing
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Event server closed the connection");
                    break;
                }
                Some(Ok(_)) => vec![],
                Some(Err(err)) => {
                    error!("❌ Event connection failed: {err}");
                    break;
                }
            },
            _ = ticker.tick(), if ping_interval.is_some() => vec![ClientMessage::Ping],
        };

        for message in &outgoing {
            if let Err(err) = write(&mut sink, message).await {
                error!("❌ Failed to send to event server: {err}");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;
    use crate::protocol::EventKind;

    type ServerSocket = WebSocketStream<TcpStream>;

    async fn server() -> (TcpListener, EventClientConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let config = EventClientConfig {
            ping_interval: None,
            ..EventClientConfig::new(&url).unwrap()
        };
        (listener, config)
    }

    async fn accept(listener: &TcpListener) -> ServerSocket {
        let (stream, _) = listener.accept().await.unwrap();
        accept_async(stream).await.unwrap()
    }

    async fn next_json(socket: &mut ServerSocket) -> serde_json::Value {
        loop {
            match socket.next().await.unwrap().unwrap() {
                Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
                _ => continue,
            }
        }
    }

    fn event_line(table_id: &str, kind: &str) -> String {
        format!(
            r#"{{"game_id":"{table_id}","timestamp":"2025-01-01T00:00:00Z","event":"{kind}","data":{{"n":1}}}}"#
        )
    }

    #[tokio::test]
    async fn we_can_stream_events_for_a_table() {
        let (listener, config) = server().await;
        let server = tokio::spawn(async move {
            let mut socket = accept(&listener).await;
            let subscribe = next_json(&mut socket).await;
            assert_eq!(subscribe["type"], "subscribe");
            assert_eq!(subscribe["game_id"], "0xabc");

            let frame = [
                event_line("0xabc", "state"),
                r#"{"type":"pong"}"#.to_string(),
                event_line("0xother", "state"),
                event_line("0xabc", "showdown"),
            ]
            .join("\n");
            socket.send(Message::text(frame)).await.unwrap();
            socket
        });

        let client = EventClient::connect(config).await.unwrap();
        let mut subscription = client.stream("0xabc").await.unwrap();

        let first = subscription.next().await.unwrap();
        assert_eq!(first.event, EventKind::State);
        assert_eq!(first.data["n"], 1);
        let second = subscription.next().await.unwrap();
        assert_eq!(second.event, EventKind::Other("showdown".to_string()));
        assert_eq!(second.game_id, "0xabc");

        drop(server.await.unwrap());
        assert!(subscription.next().await.is_none());
    }

    #[tokio::test]
    async fn we_can_subscribe_with_a_callback_and_unsubscribe() {
        let (listener, config) = server().await;
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();
        let server = tokio::spawn(async move {
            let mut socket = accept(&listener).await;
            assert_eq!(next_json(&mut socket).await["type"], "subscribe");
            socket
                .send(Message::text(event_line("0xabc", "player_joined_game")))
                .await
                .unwrap();

            let unsubscribe = next_json(&mut socket).await;
            assert_eq!(unsubscribe["type"], "unsubscribe");
            assert_eq!(unsubscribe["game_id"], "0xabc");
        });

        let client = EventClient::connect(config).await.unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = client
            .subscribe("0xabc", move |event| {
                sink.lock().unwrap().push(event.event);
                let _ = done_tx.send(());
            })
            .await
            .unwrap();
        assert_eq!(handle.table_id(), "0xabc");

        done_rx.recv().await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![EventKind::PlayerJoinedGame]);

        client.unsubscribe(handle).await.unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn a_second_subscriber_shares_the_server_subscription() {
        let (listener, config) = server().await;
        let server = tokio::spawn(async move {
            let mut socket = accept(&listener).await;
            assert_eq!(next_json(&mut socket).await["type"], "subscribe");
            // The second subscription for the same table sends nothing, so the
            // next client message is the ping.
            assert_eq!(next_json(&mut socket).await["type"], "ping");
            socket
                .send(Message::text(event_line("0xabc", "confirmed")))
                .await
                .unwrap();
            socket
        });

        let client = EventClient::connect(config).await.unwrap();
        let mut first = client.stream("0xabc").await.unwrap();
        let mut second = client.stream("0xabc").await.unwrap();
        client.ping().await.unwrap();

        assert_eq!(first.next().await.unwrap().event, EventKind::Confirmed);
        assert_eq!(second.next().await.unwrap().event, EventKind::Confirmed);
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn we_cannot_subscribe_after_the_connection_drops() {
        let (listener, config) = server().await;
        let server = tokio::spawn(async move {
            let mut socket = accept(&listener).await;
            socket.close(None).await.unwrap();
        });

        let client = EventClient::connect(config).await.unwrap();
        server.await.unwrap();

        for _ in 0..100 {
            if !client.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!client.is_connected());
        assert!(matches!(
            client.stream("0xabc").await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn we_cannot_subscribe_to_an_empty_table_id() {
        let (listener, config) = server().await;
        let server = tokio::spawn(async move { accept(&listener).await });

        let client = EventClient::connect(config).await.unwrap();
        assert!(matches!(
            client.stream(" ").await,
            Err(Error::InvalidTableId { .. })
        ));
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn we_cannot_connect_to_a_closed_port() {
        let config = EventClientConfig::new("ws://127.0.0.1:1/ws").unwrap();
        assert!(matches!(
            EventClient::connect(config).await,
            Err(Error::Connect { .. })
        ));
    }
}
