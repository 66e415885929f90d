//! Canned HTTP responder for gateway tests
//!
//! Serves one scripted response per connection, records each request target,
//! then stops. `Connection: close` on every response keeps the client from
//! pooling, so each gateway request lands on a fresh scripted slot.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

pub(crate) struct TestServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Bind on an ephemeral port and serve `responses` in order
    pub(crate) async fn spawn(mut responses: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let addr = listener.local_addr().expect("test server addr");
        let requests: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            while !responses.is_empty() {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };

                // Requests are GET with no body: read until the blank line
                let mut buf = vec![0u8; 8192];
                let mut filled = 0;
                loop {
                    match stream.read(&mut buf[filled..]).await {
                        Ok(0) => break,
                        Ok(n) => {
                            filled += n;
                            if buf[..filled].windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                            if filled == buf.len() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }

                let head = String::from_utf8_lossy(&buf[..filled]);
                if let Some(line) = head.lines().next() {
                    if let Some(target) = line.split_whitespace().nth(1) {
                        seen.lock().expect("requests lock").push(target.to_string());
                    }
                }

                let response = responses.remove(0);
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self { addr, requests }
    }

    pub(crate) fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("test server url")
    }

    /// Request targets seen so far, in order
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }
}

/// Build a full HTTP/1.1 response with the given status and body
pub(crate) fn http_response(status: u16, content_type: &str, body: &str) -> String {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    };
    format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        content_type,
        body.len(),
        body
    )
}
