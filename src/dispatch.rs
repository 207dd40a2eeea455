//! Outbound message dispatcher.
//!
//! The booking processor enqueues messages inside its transaction and never
//! talks to the SMS gateway directly. This background loop drains the queue.
//! Delivery is stubbed: claimed messages are emitted as structured log lines,
//! which is where a real gateway client would slot in.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::db::{queries, AppState};

const DISPATCH_INTERVAL: Duration = Duration::from_secs(2);
const DISPATCH_BATCH: i64 = 50;

/// Spawn the dispatcher loop. Panics inside the loop are logged rather than
/// silently killing the task.
pub fn spawn_message_dispatcher(state: AppState) {
    tokio::spawn(
        AssertUnwindSafe(async move {
            run_dispatcher(state).await;
        })
        .catch_unwind()
        .map(|result| {
            if let Err(panic) = result {
                let panic_msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Message dispatcher panicked: {}", panic_msg);
            }
        }),
    );

    tracing::info!("Message dispatcher started (stub delivery, logs only)");
}

async fn run_dispatcher(state: AppState) {
    loop {
        tokio::time::sleep(DISPATCH_INTERVAL).await;

        let conn = match state.db.get() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Dispatcher failed to get db connection: {}", e);
                continue;
            }
        };

        match queries::claim_queued_messages(&conn, DISPATCH_BATCH) {
            Ok(messages) => {
                for message in messages {
                    // Stubbed delivery: the log line IS the send.
                    tracing::info!(
                        message_id = %message.id,
                        tenant_id = %message.tenant_id,
                        channel = %message.channel.as_str(),
                        to = %message.recipient,
                        "dispatching message: {}",
                        message.body
                    );
                }
            }
            Err(e) => {
                tracing::warn!("Dispatcher failed to claim messages: {}", e);
            }
        }
    }
}
