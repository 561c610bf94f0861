//! End-to-end behaviour of the proxy over loopback sockets.

use std::time::Duration;

mod common;

use common::{
    encoded_response, gzip, ok_response, send_raw, split_reply, start_origin, start_proxy,
    start_proxy_with,
};

#[tokio::test]
async fn blocked_host_is_refused_without_contacting_origin() {
    let origin = start_origin(ok_response("text/plain", b"should not be seen")).await;
    let proxy = start_proxy(&["127.0.0.1"], &[]).await;

    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", origin.host_header());
    let reply = send_raw(proxy.addr, request.as_bytes()).await;
    let (head, body) = split_reply(&reply);

    assert!(head.starts_with("HTTP/1.1 403 Forbidden"));
    assert!(head.contains("Content-Length: 30"));
    assert_eq!(body, "<h1>Status: 403 Forbidden</h1>");
    assert_eq!(origin.hits(), 0);
}

#[tokio::test]
async fn blocklist_matches_whole_host_only() {
    let origin = start_origin(ok_response("text/plain", b"ok")).await;
    let proxy = start_proxy(&["host"], &[]).await;

    let request = format!("GET / HTTP/1.1\r\nHost: localhost:{}\r\n\r\n", origin.addr.port());
    let reply = send_raw(proxy.addr, request.as_bytes()).await;

    assert!(reply.starts_with("HTTP/1.1 200 OK"));
    assert_eq!(origin.hits(), 1);
}

#[tokio::test]
async fn forwarded_response_is_censored() {
    let origin = start_origin(ok_response("text/html", b"<p title=\"money\">free money</p>")).await;
    let proxy = start_proxy(&[], &["Money"]).await;

    let request = format!(
        "GET /page HTTP/1.1\r\nHost: {}\r\nProxy-Connection: keep-alive\r\n\r\n",
        origin.host_header()
    );
    let reply = send_raw(proxy.addr, request.as_bytes()).await;
    let (head, body) = split_reply(&reply);

    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Connection: close"));
    assert_eq!(body, "<p title=\"money\">free CENSORED</p>");
    assert!(head.contains(&format!("Content-Length: {}", body.len())));

    let seen = &origin.requests()[0];
    assert!(seen.starts_with("GET /page HTTP/1.0\r\n"));
    assert!(seen.contains("Connection: close\r\n"));
    assert!(!seen.contains("Proxy-Connection"));
}

#[tokio::test]
async fn binary_response_is_not_censored() {
    let origin = start_origin(ok_response("image/png", b"money")).await;
    let proxy = start_proxy(&[], &["money"]).await;

    let request = format!("GET /img HTTP/1.1\r\nHost: {}\r\n\r\n", origin.host_header());
    let reply = send_raw(proxy.addr, request.as_bytes()).await;
    assert_eq!(split_reply(&reply).1, "money");
}

#[tokio::test]
async fn gzip_response_is_decoded_then_censored() {
    let compressed = gzip(b"<html>you won money</html>");
    let origin = start_origin(encoded_response("text/html; charset=utf-8", "gzip", &compressed)).await;
    let proxy = start_proxy(&[], &["money"]).await;

    let request = format!(
        "GET / HTTP/1.1\r\nHost: {}\r\nAccept-Encoding: br, gzip\r\n\r\n",
        origin.host_header()
    );
    let reply = send_raw(proxy.addr, request.as_bytes()).await;
    let (head, body) = split_reply(&reply);

    assert_eq!(body, "<html>you won CENSORED</html>");
    assert!(head.contains("Content-Encoding: identity"));
    assert!(head.contains(&format!("Content-Length: {}", body.len())));
    assert!(origin.requests()[0].contains("Accept-Encoding: gzip, deflate\r\n"));
}

#[tokio::test]
async fn repeated_get_is_served_from_cache() {
    let origin = start_origin(ok_response("text/plain", b"cached body")).await;
    let proxy = start_proxy(&[], &[]).await;
    let request = format!("GET /c HTTP/1.1\r\nHost: {}\r\n\r\n", origin.host_header());

    let first = send_raw(proxy.addr, request.as_bytes()).await;
    let second = send_raw(proxy.addr, request.as_bytes()).await;

    assert_eq!(first, second);
    assert_eq!(split_reply(&second).1, "cached body");
    assert_eq!(origin.hits(), 1);

    let entries = std::fs::read_dir(proxy.cache_dir()).unwrap().count();
    assert_eq!(entries, 1);
}

#[tokio::test]
async fn concurrent_identical_misses_fetch_once() {
    let origin = common::start_origin_with_delay(
        ok_response("text/plain", b"slow"),
        Duration::from_millis(200),
    )
    .await;
    let proxy = start_proxy(&[], &[]).await;
    let request = format!("GET /same HTTP/1.1\r\nHost: {}\r\n\r\n", origin.host_header());

    let (a, b) = tokio::join!(
        send_raw(proxy.addr, request.as_bytes()),
        send_raw(proxy.addr, request.as_bytes())
    );
    assert_eq!(split_reply(&a).1, "slow");
    assert_eq!(split_reply(&b).1, "slow");
    assert_eq!(origin.hits(), 1);
}

#[tokio::test]
async fn post_is_never_cached() {
    let origin = start_origin(ok_response("text/plain", b"posted")).await;
    let proxy = start_proxy(&[], &[]).await;
    let request = format!(
        "POST /form HTTP/1.1\r\nHost: {}\r\nContent-Length: 3\r\n\r\na=1",
        origin.host_header()
    );

    send_raw(proxy.addr, request.as_bytes()).await;
    send_raw(proxy.addr, request.as_bytes()).await;
    assert_eq!(origin.hits(), 2);
}

#[tokio::test]
async fn cache_can_be_disabled() {
    let origin = start_origin(ok_response("text/plain", b"x")).await;
    let proxy = start_proxy_with(&[], &[], |config| config.cache.enabled = false).await;
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", origin.host_header());

    send_raw(proxy.addr, request.as_bytes()).await;
    send_raw(proxy.addr, request.as_bytes()).await;
    assert_eq!(origin.hits(), 2);
}

#[tokio::test]
async fn referer_restores_site_subpath() {
    let origin = start_origin(ok_response("text/plain", b"logo")).await;
    let proxy = start_proxy(&[], &[]).await;

    let request = format!(
        "GET /logo.png HTTP/1.1\r\nHost: {host}\r\nReferer: http://{host}/shop/item\r\n\r\n",
        host = origin.host_header()
    );
    send_raw(proxy.addr, request.as_bytes()).await;

    assert!(origin.requests()[0].starts_with("GET /shop/logo.png HTTP/1.0\r\n"));
}

#[tokio::test]
async fn absolute_form_target_is_forwarded_in_origin_form() {
    let origin = start_origin(ok_response("text/plain", b"abs")).await;
    let proxy = start_proxy(&[], &[]).await;

    let request = format!("GET http://{}/x?y=1 HTTP/1.1\r\n\r\n", origin.host_header());
    let reply = send_raw(proxy.addr, request.as_bytes()).await;

    assert_eq!(split_reply(&reply).1, "abs");
    let seen = &origin.requests()[0];
    assert!(seen.starts_with("GET /x?y=1 HTTP/1.0\r\n"));
    assert!(seen.contains(&format!("Host: {}\r\n", origin.host_header())));
}

#[tokio::test]
async fn http_client_through_proxy() {
    let origin = start_origin(ok_response("text/plain", b"hello money")).await;
    let proxy = start_proxy(&[], &["money"]).await;

    let client = reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(format!("http://{}", proxy.addr)).unwrap())
        .build()
        .unwrap();
    let response = client
        .get(format!("http://{}/greeting", origin.host_header()))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "hello CENSORED");
}

#[tokio::test]
async fn chunked_origin_reply_keeps_its_framing() {
    let framed = b"11\r\n<p>free money</p>\r\n0\r\n\r\n";
    let mut response =
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    response.extend_from_slice(framed);
    let origin = start_origin(response).await;
    let proxy = start_proxy(&[], &["money"]).await;

    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", origin.host_header());
    let reply = send_raw(proxy.addr, request.as_bytes()).await;
    let (head, body) = split_reply(&reply);

    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Transfer-Encoding: chunked"));
    assert!(!head.contains("Content-Length"));
    assert_eq!(body.as_bytes(), framed);
}

#[tokio::test]
async fn chunked_gzip_origin_reply_is_relayed_not_rejected() {
    let compressed = gzip(b"<html>money</html>");
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Encoding: gzip\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n",
        compressed.len()
    )
    .into_bytes();
    response.extend_from_slice(&compressed);
    response.extend_from_slice(b"\r\n0\r\n\r\n");
    let origin = start_origin(response).await;
    let proxy = start_proxy(&[], &["money"]).await;

    let request = format!(
        "GET / HTTP/1.1\r\nHost: {}\r\nAccept-Encoding: gzip\r\n\r\n",
        origin.host_header()
    );
    let reply = send_raw(proxy.addr, request.as_bytes()).await;
    let head = split_reply(&reply).0;

    assert!(head.starts_with("HTTP/1.1 200 OK"));
    assert!(head.contains("Content-Encoding: gzip"));
    assert!(head.contains("Transfer-Encoding: chunked"));
}
