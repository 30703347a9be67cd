//! Telegram Bot API HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use crate::ingest::{ChatTransport, ContentHandle, SenderRef};
use crate::telegram::types::*;

/// Extra time granted to a long poll on top of its server-side timeout.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Bot API client.
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
    max_file_size: u64,
}

impl TelegramClient {
    /// Create a new client from configuration.
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| Error::Telegram(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            max_file_size: config.max_file_size,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    /// Send a Bot API request and unwrap the response envelope.
    async fn call<T: DeserializeOwned>(&self, method: &str, request: RequestBuilder) -> Result<T> {
        tracing::debug!("Bot API call: {}", method);

        let response = request
            .send()
            .await
            .map_err(|e| Error::Telegram(format!("{} request failed: {}", method, redact(e))))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                Error::Telegram(format!("{} response unreadable: {}", method, redact(e)))
            })?;
        tracing::debug!("{} response status: {}", method, status);

        let api_response: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            Error::Telegram(format!(
                "Failed to parse {} response: {} - Response: {}",
                method,
                e,
                text.chars().take(500).collect::<String>()
            ))
        })?;

        if !api_response.ok {
            return Err(Error::Telegram(format!(
                "{} failed (HTTP {}): {}",
                method,
                status,
                api_response
                    .description
                    .unwrap_or_else(|| "no description".to_string())
            )));
        }

        api_response
            .result
            .ok_or_else(|| Error::Telegram(format!("{} returned no result", method)))
    }

    /// Get the bot's own account (validates the token).
    pub async fn get_me(&self) -> Result<User> {
        let request = self.client.get(self.method_url("getMe"));
        self.call("getMe", request).await
    }

    /// Long poll for new message updates.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_seconds: u64,
    ) -> Result<Vec<Update>> {
        let mut query: Vec<(&str, String)> = vec![
            ("timeout", timeout_seconds.to_string()),
            ("allowed_updates", r#"["message"]"#.to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let request = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&query)
            .timeout(Duration::from_secs(timeout_seconds) + POLL_GRACE);

        self.call("getUpdates", request).await
    }

    /// Resolve a file id into a downloadable path.
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        let request = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)]);
        self.call("getFile", request).await
    }

    /// Send a text message.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to: Option<i64>,
    ) -> Result<()> {
        let body = SendMessage {
            chat_id,
            text,
            reply_to_message_id: reply_to,
        };
        let request = self.client.post(self.method_url("sendMessage")).json(&body);
        let _: serde_json::Value = self.call("sendMessage", request).await?;
        Ok(())
    }

    /// Download a file's content, enforcing the size limit while streaming.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        let file = self.get_file(file_id).await?;

        if let Some(size) = file.file_size {
            if size > self.max_file_size {
                return Err(Error::FileTooLarge {
                    size,
                    limit: self.max_file_size,
                });
            }
        }

        let file_path = file
            .file_path
            .ok_or_else(|| Error::Download(format!("No file_path for file {}", file_id)))?;

        let response = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .map_err(|e| Error::Download(format!("Failed to download file: {}", redact(e))))?;
        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "Failed to download file: HTTP {}",
                response.status()
            )));
        }

        let mut content = Vec::with_capacity(file.file_size.unwrap_or(0) as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::Download(format!("Stream error: {}", redact(e))))?;
            content.extend_from_slice(&chunk);

            if content.len() as u64 > self.max_file_size {
                return Err(Error::FileTooLarge {
                    size: content.len() as u64,
                    limit: self.max_file_size,
                });
            }
        }

        tracing::debug!("Downloaded {} bytes for file {}", content.len(), file_id);
        Ok(content)
    }
}

/// Describe a transport error without its URL, which embeds the bot token.
fn redact(err: reqwest::Error) -> String {
    let err = err.without_url();
    match std::error::Error::source(&err) {
        Some(source) => format!("{}: {}", err, source),
        None => err.to_string(),
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn download(&self, handle: &ContentHandle) -> Result<Vec<u8>> {
        self.download_file(&handle.0).await
    }

    async fn notify(&self, sender: &SenderRef, text: &str) -> Result<()> {
        self.send_message(sender.chat_id, text, sender.message_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::delivery::{Delivery, DeliveryJob};
    use crate::ingest::{IncomingFile, IngestHandler, PipelineSettings, RunOutcome, Stage};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    const TOKEN: &str = "123:abc";

    fn client_for(server: &mockito::Server, max_file_size: u64) -> TelegramClient {
        let config = TelegramConfig {
            bot_token: TOKEN.to_string(),
            api_base_url: server.url(),
            max_file_size,
            ..Default::default()
        };
        TelegramClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_updates_with_offset() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/bot123:abc/getUpdates")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "101".into()),
                Matcher::UrlEncoded("timeout".into(), "0".into()),
            ]))
            .with_body(
                json!({
                    "ok": true,
                    "result": [{
                        "update_id": 101,
                        "message": {
                            "message_id": 1,
                            "chat": {"id": 42},
                            "document": {"file_id": "F1", "file_name": "a.pdf"}
                        }
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server, 1024);
        let updates = client.get_updates(Some(101), 0).await.unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 101);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/bot123:abc/getMe")
            .with_status(401)
            .with_body(r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
            .create_async()
            .await;

        let client = client_for(&server, 1024);
        let err = client.get_me().await.unwrap_err();
        assert!(matches!(err, Error::Telegram(ref msg) if msg.contains("Unauthorized")));
    }

    #[tokio::test]
    async fn test_download_file() {
        let mut server = mockito::Server::new_async().await;
        let _file = server
            .mock("GET", "/bot123:abc/getFile")
            .match_query(Matcher::UrlEncoded("file_id".into(), "F1".into()))
            .with_body(
                r#"{"ok":true,"result":{"file_id":"F1","file_size":8,"file_path":"documents/file_1.pdf"}}"#,
            )
            .create_async()
            .await;
        let _content = server
            .mock("GET", "/file/bot123:abc/documents/file_1.pdf")
            .with_body("%PDF-1.4")
            .create_async()
            .await;

        let client = client_for(&server, 1024);
        let bytes = client
            .download(&ContentHandle("F1".to_string()))
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_download_rejects_declared_oversize() {
        let mut server = mockito::Server::new_async().await;
        let _file = server
            .mock("GET", "/bot123:abc/getFile")
            .match_query(Matcher::Any)
            .with_body(
                r#"{"ok":true,"result":{"file_id":"F1","file_size":4096,"file_path":"documents/big.pdf"}}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, 1024);
        let err = client.download_file("F1").await.unwrap_err();
        assert!(matches!(err, Error::FileTooLarge { size: 4096, limit: 1024 }));
    }

    #[tokio::test]
    async fn test_download_rejects_streamed_oversize() {
        let mut server = mockito::Server::new_async().await;
        let _file = server
            .mock("GET", "/bot123:abc/getFile")
            .match_query(Matcher::Any)
            .with_body(r#"{"ok":true,"result":{"file_id":"F1","file_path":"documents/big.pdf"}}"#)
            .create_async()
            .await;
        let _content = server
            .mock("GET", "/file/bot123:abc/documents/big.pdf")
            .with_body("x".repeat(2048))
            .create_async()
            .await;

        let client = client_for(&server, 1024);
        assert!(matches!(
            client.download_file("F1").await,
            Err(Error::FileTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_notify_replies_to_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::Json(json!({
                "chat_id": 42,
                "text": "received",
                "reply_to_message_id": 7
            })))
            .with_body(r#"{"ok":true,"result":{"message_id":8}}"#)
            .create_async()
            .await;

        let client = client_for(&server, 1024);
        let sender = SenderRef {
            chat_id: 42,
            message_id: Some(7),
        };
        client.notify(&sender, "received").await.unwrap();
        mock.assert_async().await;
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

    fn unreachable_base_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_leak_token() {
        let config = TelegramConfig {
            bot_token: "123456:SECRET_TOKEN_VALUE".to_string(),
            api_base_url: unreachable_base_url(),
            request_timeout_seconds: 5,
            ..Default::default()
        };
        let client = Arc::new(TelegramClient::new(&config).unwrap());

        let err = client.download_file("F1").await.unwrap_err();
        assert!(matches!(err, Error::Telegram(_)));
        assert!(!err.to_string().contains("SECRET_TOKEN_VALUE"));

        let tmp = tempfile::tempdir().unwrap();
        let handler = IngestHandler::new(
            client,
            None,
            Arc::new(AcceptAll),
            PipelineSettings {
                staging_dir: tmp.path().to_path_buf(),
                output_format: OutputFormat::Pdf,
                recipient: "reader@kindle.com".to_string(),
                subject: "Convert".to_string(),
                max_file_size: 1024,
                unique_names: false,
                allowed_chat_ids: Vec::new(),
            },
        );
        let file = IncomingFile {
            sender: SenderRef {
                chat_id: 42,
                message_id: Some(7),
            },
            file_name: "book.pdf".to_string(),
            file_size: Some(8),
            handle: ContentHandle("F1".to_string()),
        };

        let report = handler.handle(&file).await;
        assert_eq!(report.outcome, RunOutcome::Failed(Stage::Download));
        assert!(!report.statuses.is_empty());
        for status in &report.statuses {
            assert!(!status.to_string().contains("SECRET_TOKEN_VALUE"));
        }
    }
}
