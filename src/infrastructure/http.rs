use crate::types::constants::HISTORY_PATH;
use crate::types::{ChatMessage, RealtimeError, Result};
use url::Url;

/// Fetches the persisted chat log from the chat service over HTTP
pub struct HistoryClient {
    endpoint: String,
    access_token: Option<String>,
}

impl HistoryClient {
    pub fn new(endpoint: String, access_token: Option<String>) -> Self {
        Self {
            endpoint,
            access_token,
        }
    }

    /// GETs the history, oldest message first
    pub async fn fetch(&self) -> Result<Vec<ChatMessage>> {
        let http_client = reqwest::Client::new();
        let mut request = http_client
            .get(&self.endpoint)
            .header("Accept", "application/json");

        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RealtimeError::Connection(format!("History request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RealtimeError::Connection(format!(
                "History request to '{}' failed with status: {}",
                self.endpoint,
                response.status()
            )));
        }

        let messages: Vec<ChatMessage> = response.json().await?;
        tracing::debug!("Fetched {} history messages", messages.len());
        Ok(messages)
    }
}

/// Derives the history endpoint from the socket endpoint.
///
/// The chat service serves the socket and the history on the same host, so
/// `ws://host:8082/ws` maps to `http://host:8082/messages`.
pub fn history_endpoint(ws_endpoint: &Url) -> Result<String> {
    let mut url = ws_endpoint.clone();
    let scheme = match url.scheme() {
        "ws" => "http",
        "wss" => "https",
        other => {
            return Err(RealtimeError::InvalidEndpoint(format!(
                "unsupported scheme '{}'",
                other
            )));
        }
    };

    url.set_scheme(scheme).map_err(|_| {
        RealtimeError::InvalidEndpoint(format!("cannot map '{}' to {}", ws_endpoint, scheme))
    })?;
    url.set_path(HISTORY_PATH);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{RealtimeClientBuilder, RealtimeClientOptions};
    use crate::websocket::MemoryTransport;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves one canned response and hands back the raw request head
    async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}/messages", addr), server)
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token_and_decodes_persisted_rows() {
        let body = r#"[{"ID":1,"UserID":7,"Username":"alice","Content":"hello","CreatedAt":"2024-01-01T00:00:00Z"},{"ID":2,"UserID":8,"Username":"bob","Content":"hi"}]"#;
        let (endpoint, server) = serve_once("200 OK", body).await;

        let history = HistoryClient::new(endpoint, Some("secret".to_string()))
            .fetch()
            .await
            .unwrap();

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /messages "));
        assert!(request.contains("authorization: bearer secret"));

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, Some(1));
        assert_eq!(history[0].user_id, Some(7));
        assert_eq!(history[0].username, "alice");
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].content, "hi");
    }

    #[tokio::test]
    async fn test_fetch_without_token_sends_no_authorization() {
        let (endpoint, server) = serve_once("200 OK", "[]").await;

        let history = HistoryClient::new(endpoint, None).fetch().await.unwrap();

        assert!(history.is_empty());
        assert!(!server.await.unwrap().to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_fetch_maps_server_error_to_connection_error() {
        let (endpoint, server) = serve_once("500 Internal Server Error", "{}").await;

        let result = HistoryClient::new(endpoint, None).fetch().await;

        assert!(matches!(result, Err(RealtimeError::Connection(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_client_fetch_history_uses_options() {
        let (endpoint, server) = serve_once("200 OK", r#"[{"username":"carol","content":"yo"}]"#).await;
        let client = RealtimeClientBuilder::new(
            "ws://localhost:8082/ws",
            RealtimeClientOptions {
                manual: true,
                access_token: Some("tok".to_string()),
                history_endpoint: Some(endpoint),
                ..Default::default()
            },
        )
        .unwrap()
        .with_transport(MemoryTransport::new())
        .build();

        let history = client.fetch_history().await.unwrap();

        assert_eq!(history, vec![ChatMessage::new("carol", "yo")]);
        assert!(server.await.unwrap().to_lowercase().contains("authorization: bearer tok"));
    }

    #[test]
    fn test_history_endpoint_from_plain_socket() {
        let ws = Url::parse("ws://localhost:8082/ws").unwrap();
        assert_eq!(
            history_endpoint(&ws).unwrap(),
            "http://localhost:8082/messages"
        );
    }

    #[test]
    fn test_history_endpoint_from_tls_socket_drops_query() {
        let ws = Url::parse("wss://chat.example.com/ws?room=general").unwrap();
        assert_eq!(
            history_endpoint(&ws).unwrap(),
            "https://chat.example.com/messages"
        );
    }

    #[test]
    fn test_history_endpoint_rejects_other_schemes() {
        let url = Url::parse("ftp://example.com/ws").unwrap();
        assert!(matches!(
            history_endpoint(&url),
            Err(RealtimeError::InvalidEndpoint(_))
        ));
    }
}
