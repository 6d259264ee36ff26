// ABOUTME: Bounded HTTP GET with a raw TCP connect as the degraded fallback.
// ABOUTME: HTTP status in [200, 400) counts as reachable; TCP is only tried when HTTP got no answer.

use std::time::Duration;

use http_body_util::Empty;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use tokio::net::TcpStream;
use url::Url;

/// What the verification step observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "signal", content = "status", rename_all = "snake_case")]
pub enum ProbeSignal {
    /// HTTP answered with a status in `[200, 400)`.
    Http(u16),
    /// HTTP answered, but with a status outside `[200, 400)`.
    HttpStatus(u16),
    /// HTTP got no response but a TCP connection succeeded.
    TcpOnly,
    Unreachable,
}

impl ProbeSignal {
    pub fn is_reachable(self) -> bool {
        matches!(self, ProbeSignal::Http(_) | ProbeSignal::TcpOnly)
    }
}

/// Verify `url` answers, requesting `path`.
pub async fn check_url(
    url: &Url,
    path: &str,
    http_timeout: Duration,
    tcp_timeout: Duration,
) -> ProbeSignal {
    let Some(host) = url.host_str() else {
        return ProbeSignal::Unreachable;
    };
    let Some(port) = url.port_or_known_default() else {
        return ProbeSignal::Unreachable;
    };
    let addr = format!("{host}:{port}");

    match tokio::time::timeout(http_timeout, http_status(&addr, host, path)).await {
        Ok(Ok(status)) if (200..400).contains(&status) => {
            tracing::debug!(url = %url, status, "HTTP probe succeeded");
            return ProbeSignal::Http(status);
        }
        Ok(Ok(status)) => {
            tracing::debug!(url = %url, status, "HTTP probe got error status");
            return ProbeSignal::HttpStatus(status);
        }
        Ok(Err(e)) => tracing::debug!(url = %url, error = %e, "HTTP probe failed"),
        Err(_) => tracing::debug!(url = %url, "HTTP probe timed out"),
    }

    match tokio::time::timeout(tcp_timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(_)) => {
            tracing::debug!(addr = %addr, "TCP connect succeeded");
            ProbeSignal::TcpOnly
        }
        _ => ProbeSignal::Unreachable,
    }
}

async fn http_status(
    addr: &str,
    host: &str,
    path: &str,
) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
    let stream = TcpStream::connect(addr).await?;
    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("probe connection error: {}", e);
        }
    });

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let req = hyper::Request::builder()
        .method("GET")
        .uri(path)
        .header("Host", host)
        .header("User-Agent", concat!("ephemera/", env!("CARGO_PKG_VERSION")))
        .body(Empty::<bytes::Bytes>::new())?;

    let resp = sender.send_request(req).await?;
    Ok(resp.status().as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once(response: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        port
    }

    fn url(port: u16) -> Url {
        Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()
    }

    const SHORT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn redirect_counts_as_http_success() {
        let port = serve_once("HTTP/1.1 302 Found\r\nLocation: /x\r\nContent-Length: 0\r\n\r\n").await;
        assert_eq!(check_url(&url(port), "/", SHORT, SHORT).await, ProbeSignal::Http(302));
    }

    #[tokio::test]
    async fn server_error_is_not_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket
                        .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n")
                        .await;
                });
            }
        });
        let signal = check_url(&url(port), "/", SHORT, SHORT).await;
        assert_eq!(signal, ProbeSignal::HttpStatus(503));
        assert!(!signal.is_reachable());
    }

    #[tokio::test]
    async fn silent_listener_falls_back_to_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            // accept and hang up without answering
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });
        let signal = check_url(&url(port), "/", SHORT, SHORT).await;
        assert_eq!(signal, ProbeSignal::TcpOnly);
        assert!(signal.is_reachable());
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert_eq!(
            check_url(&url(port), "/", SHORT, SHORT).await,
            ProbeSignal::Unreachable
        );
    }
}
