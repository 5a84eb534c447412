use anyhow::Error;
use async_trait::async_trait;
use log::{info, warn};
use table_events::{EventClient, EventClientConfig, TableEvent, TableEventHandler, TableListener};

/// Prints every event as a JSON line on stdout.
struct PrintingHandler {
    /// Events printed so far.
    printed: usize,
}

#[async_trait]
impl TableEventHandler for PrintingHandler {
    async fn handle_event(&mut self, event: TableEvent) {
        self.printed += 1;
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!("⚠️ Could not render {} event: {err}", event.event),
        }
    }

    async fn finished(&mut self) {
        info!("Stream ended after {} events", self.printed);
    }
}

/// Streams events for `table_id` until the server goes away or Ctrl-C.
pub(crate) async fn watch_table(ws_url: &str, table_id: &str) -> Result<(), Error> {
    let config = EventClientConfig::new(ws_url)?;
    let client = EventClient::connect(config).await?;
    let listener = TableListener::new(&client, table_id, PrintingHandler { printed: 0 }).await?;
    println!("👀 Watching table {table_id} on {ws_url} (Ctrl-C to stop)");

    tokio::select! {
        _ = listener.run() => {
            warn!("⚠️ Event stream for table {table_id} ended");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, leaving table {table_id} stream");
        }
    }
    Ok(())
}
