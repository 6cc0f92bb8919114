//! Reload notifications over fzf's `--listen` HTTP endpoint

use kube_pilot_core::{ListenerHandle, PilotError, ReloadListener};
use std::time::Duration;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// POSTs `reload(<display command>)` to a running fzf
#[derive(Debug, Clone)]
pub struct FzfListener {
    client: reqwest::Client,
    reload_action: String,
}

impl FzfListener {
    /// `display_command` is the shell command fzf runs to re-render
    pub fn new(display_command: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(NOTIFY_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            reload_action: format!("reload({})", display_command),
        }
    }

    pub fn reload_action(&self) -> &str {
        &self.reload_action
    }
}

/// URL of a `host:port` listen address
pub fn listener_url(handle: &ListenerHandle) -> String {
    let address = handle.address();
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

impl ReloadListener for FzfListener {
    async fn notify(&self, handle: &ListenerHandle) -> Result<(), PilotError> {
        let response = self
            .client
            .post(listener_url(handle))
            .body(self.reload_action.clone())
            .send()
            .await
            .map_err(|e| PilotError::ExternalOperation {
                operation: "reload".to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PilotError::ExternalOperation {
                operation: "reload".to_string(),
                message: format!("fzf answered {}", response.status()),
            });
        }
        tracing::debug!("Sent reload to {}", handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_listener_url() {
        assert_eq!(
            listener_url(&ListenerHandle::new("127.0.0.1:6266")),
            "http://127.0.0.1:6266"
        );
        assert_eq!(
            listener_url(&ListenerHandle::new("http://localhost:1")),
            "http://localhost:1"
        );
    }

    #[test]
    fn test_reload_action() {
        let listener = FzfListener::new("'/usr/bin/kube-pilot' display");
        assert_eq!(listener.reload_action(), "reload('/usr/bin/kube-pilot' display)");
    }

    #[tokio::test]
    async fn test_posts_reload_action() {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = server.local_addr().unwrap().to_string();

        let accept = tokio::spawn(async move {
            let (mut socket, _) = server.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || String::from_utf8_lossy(&request).ends_with("display)") {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        let listener = FzfListener::new("kube-pilot display");
        listener
            .notify(&ListenerHandle::new(address))
            .await
            .unwrap();

        let request = accept.await.unwrap();
        assert!(request.starts_with("POST / HTTP/1.1"));
        assert!(request.ends_with("reload(kube-pilot display)"));
    }

    #[tokio::test]
    async fn test_unreachable_listener_is_an_error() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
            socket.local_addr().unwrap().port()
        };
        let listener = FzfListener::new("kube-pilot display");
        let result = listener
            .notify(&ListenerHandle::new(format!("127.0.0.1:{}", port)))
            .await;
        assert!(matches!(result, Err(PilotError::ExternalOperation { .. })));
    }
}
