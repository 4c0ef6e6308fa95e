//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use reagent_site::config::SiteConfig;
use reagent_site::http::HttpServer;
use reagent_site::lifecycle::Shutdown;

/// A canned upstream response.
#[derive(Clone)]
pub struct Canned {
    pub status: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl Canned {
    pub fn html(body: &str) -> Self {
        Self {
            status: "200 OK",
            content_type: "text/html; charset=utf-8",
            body: body.to_string(),
        }
    }
}

/// Start a mock site server that answers every request with `response`.
///
/// Returns the bound address and a channel receiving each raw request head.
pub async fn start_mock_upstream(
    response: Canned,
) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let response = response.clone();
            let seen_tx = seen_tx.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let _ = seen_tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());

                let response_str = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nX-Upstream: mock\r\nConnection: close\r\n\r\n{}",
                    response.status,
                    response.content_type,
                    response.body.len(),
                    response.body
                );
                let _ = socket.write_all(response_str.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen_rx)
}

/// Start the front server against `upstream` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_front(
    mut config: SiteConfig,
    upstream: SocketAddr,
) -> (SocketAddr, Shutdown, mpsc::UnboundedSender<SiteConfig>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    config.listener.bind_address = addr.to_string();
    config.upstream.address = upstream.to_string();

    let shutdown = Shutdown::new();
    let (updates_tx, updates_rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config);
    let server_shutdown: broadcast::Receiver<()> = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    (addr, shutdown, updates_tx)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
