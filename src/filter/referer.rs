//! Referer-based path correction.
//!
//! A page served under `/shop` that references `/logo.png` through a
//! prefix-stripping proxy loses its site subpath. The first path segment of
//! the `Referer` URL is taken as the missing prefix and prepended to the
//! request path unless the path already starts with it.

use crate::http::message::Message;

/// Rewrite `message`'s path from its `Referer` header, in place.
///
/// Returns `true` when the path changed. Responses and requests without a
/// usable `Referer` are left untouched.
pub fn rewrite_from_referer(message: &mut Message) -> bool {
    let Some(referer) = message.headers.get("Referer") else {
        return false;
    };
    let Some(base) = referer_base(referer) else {
        return false;
    };
    let Some(path) = message.path() else {
        return false;
    };

    match rewrite_path(path, &base) {
        Some(rewritten) => {
            tracing::debug!(from = %path, to = %rewritten, "Rewriting request path from Referer");
            message.set_path(rewritten);
            true
        }
        None => false,
    }
}

/// The first path segment of a referring URL, e.g. `shop` for
/// `http://host/shop/item`.
pub fn referer_base(referer: &str) -> Option<String> {
    let segments = split_segments(referer);
    if segments.len() <= 3 {
        return None;
    }
    let base = segments[3]
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    if base.is_empty() {
        None
    } else {
        Some(base.to_string())
    }
}

/// Prefix `path` with `/base` unless it already starts with it.
pub fn rewrite_path(path: &str, base: &str) -> Option<String> {
    let prefix = format!("/{}", base);
    if path.starts_with(&prefix) {
        return None;
    }
    if path == "/" {
        Some(prefix)
    } else if path.starts_with('/') {
        Some(format!("{}{}", prefix, path))
    } else {
        Some(format!("{}/{}", prefix, path))
    }
}

/// Split on `/`, dropping the single empty segment a trailing `/` would add.
fn split_segments(value: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = value.split('/').collect();
    if value.is_empty() || value.ends_with('/') {
        segments.pop();
    }
    segments
}
