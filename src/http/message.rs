//! The message model shared by both directions of the proxy.

use std::collections::BTreeMap;

/// Header fields kept in sorted key order.
///
/// Keys are unique: a later value for the same name replaces the earlier
/// one, so repeated fields such as `Set-Cookie` keep only their last value.
/// Lookups ignore ASCII case; a replacing insert keeps the spelling of the
/// key that was stored first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .or_else(|| {
                self.fields
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.stored_key(&name) {
            Some(existing) => {
                self.fields.insert(existing, value);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let key = self.stored_key(name)?;
        self.fields.remove(&key)
    }

    /// Fields in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn stored_key(&self, name: &str) -> Option<String> {
        if self.fields.contains_key(name) {
            return Some(name.to_string());
        }
        self.fields
            .keys()
            .find(|key| key.eq_ignore_ascii_case(name))
            .cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// First line of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request {
        method: String,
        path: String,
        protocol: String,
    },
    Response {
        protocol: String,
        /// Status code and reason phrase, space-joined.
        status: String,
    },
    /// Fewer than three tokens on the first line.
    Malformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
    Malformed,
}

/// A request or response with its body already de-framed and decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub start: StartLine,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl Message {
    pub fn request(
        method: impl Into<String>,
        path: impl Into<String>,
        protocol: impl Into<String>,
        headers: Headers,
        body: Vec<u8>,
    ) -> Self {
        Self {
            start: StartLine::Request {
                method: method.into(),
                path: path.into(),
                protocol: protocol.into(),
            },
            headers,
            body,
        }
    }

    pub fn response(
        protocol: impl Into<String>,
        status: impl Into<String>,
        headers: Headers,
        body: Vec<u8>,
    ) -> Self {
        Self {
            start: StartLine::Response {
                protocol: protocol.into(),
                status: status.into(),
            },
            headers,
            body,
        }
    }

    pub fn malformed() -> Self {
        Self {
            start: StartLine::Malformed,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// A proxy-generated response such as `403 Forbidden`.
    ///
    /// The body is `<h1>Status: {code}</h1>` and `Content-Length` matches it.
    pub fn status_response(code: &str) -> Self {
        let body = format!("<h1>Status: {}</h1>", code).into_bytes();
        let mut headers = Headers::new();
        headers.insert("Content-Length", body.len().to_string());
        Self::response("HTTP/1.1", code, headers, body)
    }

    pub fn kind(&self) -> MessageKind {
        match self.start {
            StartLine::Request { .. } => MessageKind::Request,
            StartLine::Response { .. } => MessageKind::Response,
            StartLine::Malformed => MessageKind::Malformed,
        }
    }

    pub fn is_request(&self) -> bool {
        self.kind() == MessageKind::Request
    }

    pub fn method(&self) -> Option<&str> {
        match &self.start {
            StartLine::Request { method, .. } => Some(method),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match &self.start {
            StartLine::Request { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Replace the request path; no-op on responses.
    pub fn set_path(&mut self, new_path: impl Into<String>) {
        if let StartLine::Request { path, .. } = &mut self.start {
            *path = new_path.into();
        }
    }

    /// Replace the protocol token of either start line.
    pub fn set_protocol(&mut self, new_protocol: impl Into<String>) {
        match &mut self.start {
            StartLine::Request { protocol, .. } | StartLine::Response { protocol, .. } => {
                *protocol = new_protocol.into();
            }
            StartLine::Malformed => {}
        }
    }

    pub fn protocol(&self) -> Option<&str> {
        match &self.start {
            StartLine::Request { protocol, .. } | StartLine::Response { protocol, .. } => Some(protocol),
            StartLine::Malformed => None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        match &self.start {
            StartLine::Response { status, .. } => Some(status),
            _ => None,
        }
    }

    /// Numeric status code of a response, if the status text starts with one.
    pub fn status_code(&self) -> Option<u16> {
        self.status()?.split_whitespace().next()?.parse().ok()
    }
}
