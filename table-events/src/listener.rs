//! # Table Listener
//!
//! Drives a [`TableEventHandler`] from a single table subscription until the
//! subscription ends.
//!
//! - [`TableEventHandler`]: what to do with each event.
//! - [`TableListener`]: owns the subscription and feeds the handler in order.

use async_trait::async_trait;
use log::{error, info};

use crate::client::{EventClient, Subscription};
use crate::error::Result;
use crate::protocol::{EventKind, TableEvent};

/// Handles events for one table.
#[async_trait]
pub trait TableEventHandler {
    /// Called for every event, in arrival order.
    async fn handle_event(&mut self, event: TableEvent);

    /// Called once the subscription has ended.
    async fn finished(&mut self) {}
}

/// Listens to one table and dispatches its events to a handler.
pub struct TableListener<H>
where
    H: TableEventHandler + Send,
{
    /// Events for the table.
    subscription: Subscription,
    /// Receives every event.
    handler: H,
}

impl<H> TableListener<H>
where
    H: TableEventHandler + Send,
{
    /// Subscribes to `table_id` on `client`.
    pub async fn new(client: &EventClient, table_id: &str, handler: H) -> Result<Self> {
        let subscription = client.stream(table_id).await?;
        Ok(Self {
            subscription,
            handler,
        })
    }

    /// Processes events until the subscription ends and returns the handler.
    pub async fn run(mut self) -> H {
        let table_id = self.subscription.handle().table_id().to_string();
        info!("Listening to table {table_id}...");

        let mut count = 0usize;
        while let Some(event) = self.subscription.next().await {
            if event.event == EventKind::Error {
                error!("❌ Server reported an error for table {table_id}: {}", event.data);
            }
            count += 1;
            self.handler.handle_event(event).await;
        }

        info!("🔌 Subscription to table {table_id} ended after {count} events");
        self.handler.finished().await;
        self.handler
    }
}

#[cfg(test)]
mod tests {
    use futures::{SinkExt, StreamExt};
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;
    use tokio_tungstenite::tungstenite::Message;

    use super::*;
    use crate::client::EventClientConfig;

    #[derive(Default)]
    struct Recorder {
        kinds: Vec<EventKind>,
        finished: bool,
    }

    #[async_trait]
    impl TableEventHandler for Recorder {
        async fn handle_event(&mut self, event: TableEvent) {
            self.kinds.push(event.event);
        }

        async fn finished(&mut self) {
            self.finished = true;
        }
    }

    #[tokio::test]
    async fn we_can_run_a_listener_until_the_server_goes_away() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();
            // Wait for the subscribe message.
            loop {
                if let Message::Text(_) = socket.next().await.unwrap().unwrap() {
                    break;
                }
            }
            let frame = [
                r#"{"game_id":"g1","timestamp":"t","event":"game_created","data":{}}"#,
                r#"{"game_id":"g1","timestamp":"t","event":"error","data":"boom"}"#,
                r#"{"game_id":"g1","timestamp":"t","event":"pending","data":{}}"#,
            ]
            .join("\n");
            socket.send(Message::text(frame)).await.unwrap();
            socket.close(None).await.unwrap();
        });

        let config = EventClientConfig {
            ping_interval: None,
            ..EventClientConfig::new(&url).unwrap()
        };
        let client = EventClient::connect(config).await.unwrap();
        let recorder = TableListener::new(&client, "g1", Recorder::default())
            .await
            .unwrap()
            .run()
            .await;

        server.await.unwrap();
        assert_eq!(
            recorder.kinds,
            vec![EventKind::GameCreated, EventKind::Error, EventKind::Pending]
        );
        assert!(recorder.finished);
    }
}
