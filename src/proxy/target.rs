//! Request target resolution.
//!
//! Browsers talking to a forward proxy send absolute-form targets
//! (`GET http://host/page HTTP/1.1`); origin servers expect origin-form
//! (`GET /page HTTP/1.1`). The target is normalized before any path rewrite
//! so the Referer rewrite and the cache key both see the origin-form path.

use url::Url;

use crate::http::message::Message;
use crate::net::upstream::{Target, DEFAULT_PORT};

/// Rewrite an absolute-form request target to origin-form, in place.
///
/// Returns the authority the absolute URL named. A missing `Host` header is
/// filled in from it. Origin-form targets are left untouched.
pub fn normalize_absolute_form(message: &mut Message) -> Option<Target> {
    let path = message.path()?;
    if path.starts_with('/') {
        return None;
    }

    let url = Url::parse(path).ok()?;
    let host = url.host_str()?.to_string();
    let port = url.port_or_known_default().unwrap_or(DEFAULT_PORT);

    let mut origin_form = url.path().to_string();
    if let Some(query) = url.query() {
        origin_form.push('?');
        origin_form.push_str(query);
    }

    tracing::debug!(from = %path, to = %origin_form, "Normalizing absolute-form target");
    message.set_path(origin_form);

    if !message.headers.contains("Host") {
        let host_value = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.clone(),
        };
        message.headers.insert("Host", host_value);
    }

    Some(Target::new(host, port))
}

/// The upstream a request should go to: its `Host` header, falling back to
/// the authority of an absolute-form target.
pub fn resolve_target(message: &Message, absolute: Option<Target>) -> Option<Target> {
    message
        .headers
        .get("Host")
        .and_then(Target::parse)
        .or(absolute)
}
