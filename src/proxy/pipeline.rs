//! The request/response exchange for one client connection.
//!
//! # Responsibilities
//! - Drive one connection through parse, block, forward, filter, cache, reply
//! - Turn every failure into either a synthesized status reply or a close
//! - Record the outcome in logs and metrics
//!
//! # Design Decisions
//! - The client stream is generic so the whole exchange runs over in-memory
//!   pipes in tests; the upstream is always a fresh TCP connection
//! - Cache trouble is logged and otherwise ignored; it never fails a request
//! - The per-key cache claim is held from lookup until the store finishes

use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use crate::cache::{CacheKey, FlightGuard};
use crate::error::{ProxyError, Result};
use crate::filter::{is_text_like, rewrite_from_referer};
use crate::http::body::is_chunk_framed;
use crate::http::message::{Message, MessageKind};
use crate::http::reader::read_message;
use crate::net::io::write_all;
use crate::net::upstream::{self, Target};
use crate::observability::metrics::{self, Outcome};
use crate::proxy::target::{normalize_absolute_form, resolve_target};
use crate::proxy::{ConnectionContext, ProxyState};

const UPSTREAM_PROTOCOL: &str = "HTTP/1.0";

/// Pipeline step, used to decide how a failure is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadRequest,
    ResolveTarget,
    ConnectUpstream,
    ForwardRequest,
    ReadResponse,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ReadRequest => "read_request",
            Stage::ResolveTarget => "resolve_target",
            Stage::ConnectUpstream => "connect_upstream",
            Stage::ForwardRequest => "forward_request",
            Stage::ReadResponse => "read_response",
        }
    }
}

#[derive(Debug)]
struct Failure {
    stage: Stage,
    error: ProxyError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, Failure>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, Failure> {
        self.map_err(|error| Failure { stage, error })
    }
}

/// What goes back to the client.
enum Reply {
    /// A message built or received during this exchange.
    Message(Message),
    /// Serialized bytes straight from the cache.
    Cached(Vec<u8>),
}

/// Serve one client connection to completion and report how it ended.
///
/// Never fails: every error is either answered with a status response or
/// ends the connection silently, depending on where it happened.
pub async fn serve_connection<C>(client: &mut C, ctx: &ConnectionContext) -> Outcome
where
    C: AsyncRead + AsyncWrite + Unpin,
{
    let started = Instant::now();
    let state = &*ctx.state;

    let outcome = match exchange(client, state).await {
        Ok(Some((reply, outcome))) => match send_reply(client, state, reply).await {
            Ok(()) => outcome,
            Err(e) => {
                tracing::debug!(error = %e, "Client went away before the reply was written");
                Outcome::Error
            }
        },
        Ok(None) => {
            tracing::debug!("Client closed without sending a request");
            return Outcome::Error;
        }
        Err(failure) => {
            answer_failure(client, state, failure).await;
            Outcome::Error
        }
    };

    metrics::record_request(outcome, started);
    tracing::info!(
        outcome = outcome.as_str(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Connection finished"
    );
    outcome
}

async fn exchange<C>(
    client: &mut C,
    state: &ProxyState,
) -> std::result::Result<Option<(Reply, Outcome)>, Failure>
where
    C: AsyncRead + Unpin,
{
    let Some(mut request) = read_message(client, &state.limits)
        .await
        .at(Stage::ReadRequest)?
    else {
        return Ok(None);
    };
    tracing::info!("Client request:\n{}", request.to_log_string());

    if !request.is_request() {
        return Err(reject(Stage::ReadRequest, "expected a request, got a response"));
    }
    if request.method() == Some("CONNECT") {
        return Err(reject(Stage::ResolveTarget, "CONNECT tunnelling is not supported"));
    }

    let absolute = normalize_absolute_form(&mut request);
    rewrite_from_referer(&mut request);

    let Some(target) = resolve_target(&request, absolute) else {
        return Err(reject(Stage::ResolveTarget, "no Host header or absolute target"));
    };

    if state.blocklist.is_blocked(&target.host) {
        tracing::info!(host = %target.host, "Blocked host");
        let blocked = Message::status_response(&state.responses.blocked_status);
        return Ok(Some((Reply::Message(blocked), Outcome::Blocked)));
    }

    // Only GETs are cacheable; the claim serializes identical misses.
    let mut claim: Option<FlightGuard> = None;
    if let (Some(cache), Some("GET"), Some(path)) = (&state.cache, request.method(), request.path()) {
        let key = CacheKey::new(&target.authority(), path);
        let guard = cache.claim(&key).await;
        match cache.lookup(&key).await {
            Ok(Some(bytes)) => {
                tracing::info!(key = %key, bytes = bytes.len(), "Serving from cache");
                return Ok(Some((Reply::Cached(bytes), Outcome::CacheHit)));
            }
            Ok(None) => claim = Some(guard),
            Err(e) => tracing::warn!(key = %key, error = %e, "Cache lookup failed, forwarding"),
        }
    }

    let mut response = forward(&target, request, state).await?;
    tracing::info!("Upstream response:\n{}", response.to_log_string());

    censor_body(&mut response, state);
    finish_reply(&mut response);

    if let (Some(cache), Some(claim)) = (&state.cache, claim) {
        if response.status_code() == Some(200) {
            if let Err(e) = cache.store(claim.key(), &response.to_bytes()).await {
                tracing::warn!(key = %claim.key(), error = %e, "Cache store failed");
            }
        }
    }

    Ok(Some((Reply::Message(response), Outcome::Forwarded)))
}

/// Connect, send `request`, and read back the decoded response.
async fn forward(
    target: &Target,
    mut request: Message,
    state: &ProxyState,
) -> std::result::Result<Message, Failure> {
    let mut upstream: TcpStream = upstream::connect(target, state.connect_timeout)
        .await
        .at(Stage::ConnectUpstream)?;

    prepare_forwarded(&mut request);
    write_all(&mut upstream, &request.to_bytes(), state.write_timeout)
        .await
        .at(Stage::ForwardRequest)?;

    match read_message(&mut upstream, &state.limits)
        .await
        .at(Stage::ReadResponse)?
    {
        Some(response) if response.kind() == MessageKind::Response => Ok(response),
        Some(_) => Err(reject(Stage::ReadResponse, "upstream sent a request line")),
        None => Err(reject(Stage::ReadResponse, "upstream closed before responding")),
    }
}

/// Start-line and header adjustments for the upstream leg.
///
/// The request goes out as `HTTP/1.0` so origins answer with length- or
/// close-delimited bodies rather than chunked ones.
pub fn prepare_forwarded(request: &mut Message) {
    request.set_protocol(UPSTREAM_PROTOCOL);
    request.headers.insert("Connection", "close");
    request.headers.remove("Proxy-Connection");
    // Keep the upstream to encodings that can be reversed here.
    if request.headers.contains("Accept-Encoding") {
        request.headers.insert("Accept-Encoding", "gzip, deflate");
    }
}

fn censor_body(response: &mut Message, state: &ProxyState) {
    let Some(censor) = &state.censor else {
        return;
    };
    let text_like = response
        .headers
        .get("Content-Type")
        .is_some_and(is_text_like);
    if !text_like || response.body.is_empty() || is_chunk_framed(&response.headers) {
        return;
    }

    let censored = censor.censor(&response.body);
    if censored != response.body {
        tracing::debug!(before = response.body.len(), after = censored.len(), "Censored response body");
        response.headers.insert("Content-Length", censored.len().to_string());
        response.body = censored;
    }
}

/// Every reply closes the connection after it is written.
fn finish_reply(response: &mut Message) {
    response.headers.insert("Connection", "close");
}

async fn send_reply<C>(client: &mut C, state: &ProxyState, reply: Reply) -> Result<()>
where
    C: AsyncWrite + Unpin,
{
    let bytes = match reply {
        Reply::Message(mut message) => {
            finish_reply(&mut message);
            message.to_bytes()
        }
        Reply::Cached(bytes) => bytes,
    };
    write_all(client, &bytes, state.write_timeout).await
}

async fn answer_failure<C>(client: &mut C, state: &ProxyState, failure: Failure)
where
    C: AsyncWrite + Unpin,
{
    let Failure { stage, error } = failure;

    let status = match stage {
        // Client socket trouble: nobody left to answer.
        Stage::ReadRequest | Stage::ResolveTarget if error.is_socket_error() || error.is_timeout() => None,
        Stage::ReadRequest | Stage::ResolveTarget => Some(&state.responses.bad_request_status),
        Stage::ConnectUpstream | Stage::ForwardRequest | Stage::ReadResponse => {
            metrics::record_upstream_error(error.kind());
            if error.is_timeout() {
                Some(&state.responses.gateway_timeout_status)
            } else {
                Some(&state.responses.bad_gateway_status)
            }
        }
    };

    let Some(status) = status else {
        tracing::debug!(stage = stage.as_str(), error = %error, "Closing connection without reply");
        return;
    };

    tracing::warn!(stage = stage.as_str(), error = %error, status = %status, "Exchange failed");
    let reply = Reply::Message(Message::status_response(status));
    if let Err(e) = send_reply(client, state, reply).await {
        tracing::debug!(error = %e, "Could not deliver error reply");
    }
}

fn reject(stage: Stage, reason: &str) -> Failure {
    Failure {
        stage,
        error: ProxyError::MalformedMessage(reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::filter::{Blocklist, WordCensor};
    use crate::net::ConnectionId;
    use std::sync::Arc;
    use tokio::io::AsyncReadExt;

    fn context(blocked: &[&str]) -> ConnectionContext {
        let mut config = ProxyConfig::default();
        config.timeouts.read_secs = 2;
        config.timeouts.connect_secs = 2;
        let state = ProxyState::new(
            &config,
            Blocklist::new(blocked.iter().copied()),
            WordCensor::new(["money"], "CENSORED"),
            None,
        );
        ConnectionContext {
            id: ConnectionId::new(),
            peer: "127.0.0.1:9".parse().unwrap(),
            state: Arc::new(state),
        }
    }

    async fn run(request: &[u8], ctx: &ConnectionContext) -> (Outcome, String) {
        let (mut proxy_side, mut client_side) = tokio::io::duplex(64 * 1024);
        tokio::io::AsyncWriteExt::write_all(&mut client_side, request).await.unwrap();
        tokio::io::AsyncWriteExt::shutdown(&mut client_side).await.unwrap();

        let outcome = serve_connection(&mut proxy_side, ctx).await;
        drop(proxy_side);

        let mut reply = Vec::new();
        client_side.read_to_end(&mut reply).await.unwrap();
        (outcome, String::from_utf8_lossy(&reply).into_owned())
    }

    #[tokio::test]
    async fn blocked_host_gets_forbidden() {
        let ctx = context(&["bad.com"]);
        let (outcome, reply) = run(b"GET / HTTP/1.1\r\nHost: bad.com\r\n\r\n", &ctx).await;

        assert_eq!(outcome, Outcome::Blocked);
        assert!(reply.starts_with("HTTP/1.1 403 Forbidden\r\n"));
        assert!(reply.contains("Connection: close\r\n"));
        assert!(reply.ends_with("<h1>Status: 403 Forbidden</h1>"));
    }

    #[tokio::test]
    async fn blocklist_ignores_port() {
        let ctx = context(&["bad.com"]);
        let (outcome, _) = run(b"GET / HTTP/1.1\r\nHost: bad.com:8080\r\n\r\n", &ctx).await;
        assert_eq!(outcome, Outcome::Blocked);
    }

    #[tokio::test]
    async fn malformed_request_gets_bad_request() {
        let ctx = context(&[]);
        let (outcome, reply) = run(b"NONSENSE\r\n\r\n", &ctx).await;

        assert_eq!(outcome, Outcome::Error);
        assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn missing_host_gets_bad_request() {
        let ctx = context(&[]);
        let (_, reply) = run(b"GET /page HTTP/1.1\r\nAccept: */*\r\n\r\n", &ctx).await;
        assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn silent_client_gets_no_reply() {
        let ctx = context(&[]);
        let (outcome, reply) = run(b"", &ctx).await;
        assert_eq!(outcome, Outcome::Error);
        assert!(reply.is_empty());
    }

    #[tokio::test]
    async fn unreachable_upstream_gets_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let ctx = context(&[]);
        let request = format!("GET / HTTP/1.1\r\nHost: 127.0.0.1:{}\r\n\r\n", port);
        let (outcome, reply) = run(request.as_bytes(), &ctx).await;

        assert_eq!(outcome, Outcome::Error);
        assert!(reply.starts_with("HTTP/1.1 502 Bad Gateway\r\n"));
    }

    #[tokio::test]
    async fn undecodable_request_body_gets_bad_request() {
        let ctx = context(&[]);
        let (outcome, reply) = run(
            b"POST / HTTP/1.1\r\nHost: a.com\r\nContent-Encoding: gzip\r\n\r\nnot gzip at all",
            &ctx,
        )
        .await;

        assert_eq!(outcome, Outcome::Error);
        assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn unsupported_request_encoding_gets_bad_request() {
        let ctx = context(&[]);
        let (_, reply) = run(b"POST / HTTP/1.1\r\nHost: a.com\r\nContent-Encoding: br\r\n\r\nxyz", &ctx).await;
        assert!(reply.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[test]
    fn forwarded_headers() {
        let mut request = crate::http::parser::parse_head(
            "GET / HTTP/1.1\r\nHost: a\r\nProxy-Connection: keep-alive\r\naccept-encoding: br, gzip",
        );
        prepare_forwarded(&mut request);

        assert_eq!(request.protocol(), Some("HTTP/1.0"));
        assert_eq!(request.headers.get("Connection"), Some("close"));
        assert!(!request.headers.contains("Proxy-Connection"));
        assert_eq!(request.headers.get("Accept-Encoding"), Some("gzip, deflate"));
    }

    #[test]
    fn no_accept_encoding_is_not_added() {
        let mut request = crate::http::parser::parse_head("GET / HTTP/1.1\r\nHost: a");
        prepare_forwarded(&mut request);
        assert!(!request.headers.contains("Accept-Encoding"));
    }

    #[test]
    fn censor_updates_length_for_text_only() {
        let ctx = context(&[]);
        let mut html = crate::http::parser::parse_head(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 17",
        );
        html.body = b"<b>free</b> money".to_vec();
        censor_body(&mut html, &ctx.state);
        assert_eq!(html.body, b"<b>free</b> CENSORED".to_vec());
        assert_eq!(html.headers.get("Content-Length"), Some("20"));

        let mut image = crate::http::parser::parse_head(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 5",
        );
        image.body = b"money".to_vec();
        censor_body(&mut image, &ctx.state);
        assert_eq!(image.body, b"money".to_vec());
    }

    #[test]
    fn chunk_framed_body_is_not_censored() {
        let ctx = context(&[]);
        let mut chunked = crate::http::parser::parse_head(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked",
        );
        chunked.body = b"5\r\nmoney\r\n0\r\n\r\n".to_vec();
        censor_body(&mut chunked, &ctx.state);

        assert_eq!(chunked.body, b"5\r\nmoney\r\n0\r\n\r\n".to_vec());
        assert!(!chunked.headers.contains("Content-Length"));
    }
}
