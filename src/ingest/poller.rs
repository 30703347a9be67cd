//! Telegram long polling loop.

use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use tokio::time::sleep;

use crate::error::Result;
use crate::ingest::handler::{IngestHandler, RunOutcome};
use crate::ingest::{ContentHandle, IncomingFile, SenderRef};
use crate::telegram::{TelegramClient, Update};

/// Pause after a failed getUpdates call.
pub const POLL_ERROR_PAUSE: Duration = Duration::from_secs(5);

/// Turn an update into a document notification, if it carries one.
pub fn incoming_file(update: &Update) -> Option<IncomingFile> {
    let message = update.message.as_ref()?;
    let document = message.document.as_ref()?;

    Some(IncomingFile {
        sender: SenderRef {
            chat_id: message.chat.id,
            message_id: Some(message.message_id),
        },
        file_name: document.file_name.clone().unwrap_or_default(),
        file_size: document.file_size,
        handle: ContentHandle(document.file_id.clone()),
    })
}

/// Offset to acknowledge every update up to and including `updates`.
pub fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map(|latest| current.map_or(latest, |c| c.max(latest)))
        .or(current)
}

/// Poll Telegram and feed documents to the handler until Ctrl-C.
///
/// Documents are handled one at a time, in update order.
pub async fn run_polling(
    client: &TelegramClient,
    handler: &IngestHandler,
    poll_timeout_seconds: u64,
) -> Result<()> {
    poll_until(client, handler, poll_timeout_seconds, tokio::signal::ctrl_c()).await
}

/// Poll until `shutdown` completes.
///
/// The shutdown future is polled while waiting for updates, during the
/// error pause and between documents. A document already being handled
/// runs to completion first.
pub async fn poll_until<F>(
    client: &TelegramClient,
    handler: &IngestHandler,
    poll_timeout_seconds: u64,
    shutdown: F,
) -> Result<()>
where
    F: Future,
{
    tokio::pin!(shutdown);
    let mut offset: Option<i64> = None;

    loop {
        let updates = tokio::select! {
            result = client.get_updates(offset, poll_timeout_seconds) => result,
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, stopping poller");
                return Ok(());
            }
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!("getUpdates failed: {}", e);
                tokio::select! {
                    _ = sleep(POLL_ERROR_PAUSE) => continue,
                    _ = &mut shutdown => {
                        tracing::info!("Shutdown requested, stopping poller");
                        return Ok(());
                    }
                }
            }
        };

        offset = next_offset(offset, &updates);

        for update in &updates {
            let Some(file) = incoming_file(update) else {
                continue;
            };

            let report = handler.handle(&file).await;
            match report.outcome {
                RunOutcome::Ignored => {}
                RunOutcome::Delivered => tracing::info!(
                    "Relayed {} ({} staged files removed)",
                    file.file_name,
                    report.removed_files
                ),
                RunOutcome::Failed(stage) => {
                    tracing::warn!("Relay of {} failed at {} stage", file.file_name, stage)
                }
            }

            // Signals that arrived while handling are picked up here
            if (&mut shutdown).now_or_never().is_some() {
                tracing::info!("Shutdown requested, stopping poller");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFormat, TelegramConfig};
    use crate::delivery::{Delivery, DeliveryJob};
    use crate::ingest::{ChatTransport, PipelineSettings};
    use crate::telegram::{Chat, Document, Message};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tokio::sync::oneshot;

    fn update(id: i64, document: Option<Document>) -> Update {
        Update {
            update_id: id,
            message: Some(Message {
                message_id: id * 10,
                chat: Chat { id: 42 },
                from: None,
                document,
            }),
        }
    }

    fn document(name: Option<&str>) -> Document {
        Document {
            file_id: "F1".to_string(),
            file_unique_id: None,
            file_name: name.map(str::to_string),
            mime_type: Some("application/pdf".to_string()),
            file_size: Some(10),
        }
    }

    #[test]
    fn test_incoming_file_from_document() {
        let file = incoming_file(&update(5, Some(document(Some("a.pdf"))))).unwrap();
        assert_eq!(file.file_name, "a.pdf");
        assert_eq!(file.sender.chat_id, 42);
        assert_eq!(file.sender.message_id, Some(50));
        assert_eq!(file.handle, ContentHandle("F1".to_string()));
    }

    #[test]
    fn test_text_message_is_not_a_file() {
        assert!(incoming_file(&update(5, None)).is_none());
        assert!(incoming_file(&Update {
            update_id: 1,
            message: None
        })
        .is_none());
    }

    #[test]
    fn test_nameless_document_has_empty_name() {
        let file = incoming_file(&update(5, Some(document(None)))).unwrap();
        assert!(file.file_name.is_empty());
    }

    #[test]
    fn test_next_offset() {
        assert_eq!(next_offset(None, &[]), None);
        assert_eq!(next_offset(Some(10), &[]), Some(10));
        assert_eq!(
            next_offset(None, &[update(3, None), update(7, None)]),
            Some(8)
        );
        assert_eq!(next_offset(Some(20), &[update(7, None)]), Some(20));
    }

    /// Serves a fixed document and fires `on_download` the first time.
    struct SignallingTransport {
        on_download: Mutex<Option<oneshot::Sender<()>>>,
    }

    #[async_trait]
    impl ChatTransport for SignallingTransport {
        async fn download(&self, _handle: &ContentHandle) -> Result<Vec<u8>> {
            if let Some(tx) = self.on_download.lock().unwrap().take() {
                let _ = tx.send(());
            }
            Ok(b"%PDF-1.4".to_vec())
        }

        async fn notify(&self, _sender: &SenderRef, _text: &str) -> Result<()> {
            Ok(())
        }
    }

    struct AcceptAll;

    #[async_trait]
    impl Delivery for AcceptAll {
        fn channel(&self) -> &'static str {
            "test"
        }

        async fn deliver(&self, _job: &DeliveryJob) -> Result<()> {
            Ok(())
        }
    }

    fn handler(transport: Arc<dyn ChatTransport>, dir: &std::path::Path) -> IngestHandler {
        IngestHandler::new(
            transport,
            None,
            Arc::new(AcceptAll),
            PipelineSettings {
                staging_dir: dir.to_path_buf(),
                output_format: OutputFormat::Pdf,
                recipient: "reader@kindle.com".to_string(),
                subject: "Convert".to_string(),
                max_file_size: 1024,
                unique_names: false,
                allowed_chat_ids: Vec::new(),
            },
        )
    }

    fn client(base_url: String) -> TelegramClient {
        TelegramClient::new(&TelegramConfig {
            bot_token: "123:abc".to_string(),
            api_base_url: base_url,
            request_timeout_seconds: 5,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_error_pause() {
        let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let client = client(format!("http://{}", closed.local_addr().unwrap()));
        drop(closed);

        let tmp = tempfile::tempdir().unwrap();
        let (tx, _rx) = oneshot::channel();
        let transport = Arc::new(SignallingTransport {
            on_download: Mutex::new(Some(tx)),
        });
        let handler = handler(transport, tmp.path());

        let started = Instant::now();
        let shutdown = sleep(Duration::from_millis(200));
        tokio::time::timeout(
            Duration::from_secs(3),
            poll_until(&client, &handler, 0, shutdown),
        )
        .await
        .expect("poller kept sleeping after shutdown")
        .unwrap();
        assert!(started.elapsed() < POLL_ERROR_PAUSE);
    }

    #[tokio::test]
    async fn test_shutdown_during_handling_stops_after_document() {
        let mut server = mockito::Server::new_async().await;
        let updates = server
            .mock("GET", "/bot123:abc/getUpdates")
            .match_query(mockito::Matcher::Any)
            .with_body(
                serde_json::json!({
                    "ok": true,
                    "result": [{
                        "update_id": 1,
                        "message": {
                            "message_id": 10,
                            "chat": {"id": 42},
                            "document": {"file_id": "F1", "file_name": "book.pdf", "file_size": 8}
                        }
                    }]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        let client = client(server.url());

        let tmp = tempfile::tempdir().unwrap();
        let (tx, rx) = oneshot::channel();
        let transport = Arc::new(SignallingTransport {
            on_download: Mutex::new(Some(tx)),
        });
        let handler = handler(transport, tmp.path());

        tokio::time::timeout(
            Duration::from_secs(5),
            poll_until(&client, &handler, 0, rx),
        )
        .await
        .expect("poller ignored shutdown raised during handling")
        .unwrap();

        updates.assert_async().await;
        assert!(!tmp.path().join("book.pdf").exists());
    }
}
