//! Shared utilities for the integration tests: raw-socket origin servers and
//! a proxy running on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use filtering_proxy::config::ProxyConfig;
use filtering_proxy::lifecycle::{prepare_state, Shutdown};
use filtering_proxy::net::Listener;
use filtering_proxy::ProxyServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// An origin server answering every connection with the same bytes.
pub struct MockOrigin {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockOrigin {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Header blocks of every request received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn host_header(&self) -> String {
        format!("127.0.0.1:{}", self.addr.port())
    }
}

/// Start an origin that reads one request per connection, answers with
/// `response` and closes.
pub async fn start_origin(response: Vec<u8>) -> MockOrigin {
    start_origin_with_delay(response, Duration::ZERO).await
}

/// Like [`start_origin`], waiting `delay` before answering.
pub async fn start_origin_with_delay(response: Vec<u8>, delay: Duration) -> MockOrigin {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let response = Arc::new(response);

    let (task_hits, task_requests) = (hits.clone(), requests.clone());
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let (hits, requests, response) =
                (task_hits.clone(), task_requests.clone(), response.clone());
            tokio::spawn(async move {
                hits.fetch_add(1, Ordering::SeqCst);
                let head = read_request_head(&mut socket).await;
                requests.lock().unwrap().push(head);
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockOrigin {
        addr,
        hits,
        requests,
    }
}

/// A plain `200 OK` with a `Content-Length` body.
pub fn ok_response(content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut bytes = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        content_type,
        body.len()
    )
    .into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// A `200 OK` whose body is close-delimited and carries `encoding`.
pub fn encoded_response(content_type: &str, encoding: &str, body: &[u8]) -> Vec<u8> {
    let mut bytes = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Encoding: {}\r\n\r\n",
        content_type, encoding
    )
    .into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// A proxy serving on an ephemeral loopback port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<()>,
    pub dir: tempfile::TempDir,
}

impl TestProxy {
    pub fn cache_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("cache")
    }
}

pub async fn start_proxy(blocked: &[&str], words: &[&str]) -> TestProxy {
    start_proxy_with(blocked, words, |_| {}).await
}

pub async fn start_proxy_with(
    blocked: &[&str],
    words: &[&str],
    tweak: impl FnOnce(&mut ProxyConfig),
) -> TestProxy {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("blocked.txt"), blocked.join("\n")).unwrap();
    std::fs::write(dir.path().join("words.txt"), words.join("\n")).unwrap();

    let mut config = ProxyConfig::default();
    config.files.blocklist = dir.path().join("blocked.txt");
    config.files.words = dir.path().join("words.txt");
    config.files.cache_dir = dir.path().join("cache");
    config.timeouts.connect_secs = 2;
    config.timeouts.read_secs = 2;
    config.timeouts.shutdown_grace_secs = 1;
    tweak(&mut config);

    let state = Arc::new(prepare_state(&config).unwrap());
    let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tcp(socket, config.listener.max_connections);
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = ProxyServer::new(state, config.timeouts.shutdown_grace());
    let server_shutdown = shutdown.clone();
    let handle = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    // Let the accept loop subscribe before tests can trigger shutdown.
    tokio::time::sleep(Duration::from_millis(20)).await;

    TestProxy {
        addr,
        shutdown,
        handle,
        dir,
    }
}

/// Send raw request bytes through the proxy and collect the whole reply.
pub async fn send_raw(proxy: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();

    // A reset after the reply (unread request bytes) still counts as a close.
    let mut reply = Vec::new();
    let mut chunk = [0u8; 4096];
    let read_all = async {
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => reply.extend_from_slice(&chunk[..n]),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(10), read_all)
        .await
        .expect("proxy did not close the connection");
    String::from_utf8_lossy(&reply).into_owned()
}

/// Split a reply into its head and body.
pub fn split_reply(reply: &str) -> (&str, &str) {
    reply.split_once("\r\n\r\n").unwrap_or((reply, ""))
}
