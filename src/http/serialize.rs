//! Wire and log rendering of messages.

use std::fmt::Write as _;

use crate::http::message::{Message, StartLine};

impl Message {
    /// Render the message as it goes on the wire.
    ///
    /// Headers follow in sorted key order as `Key: value\r\n`, then a blank
    /// line, then the body verbatim. A malformed message renders as nothing.
    pub fn to_bytes(&self) -> Vec<u8> {
        let Some(start) = self.start_line() else {
            return Vec::new();
        };

        let mut head = start;
        head.push_str("\r\n");
        for (name, value) in self.headers.iter() {
            let _ = write!(head, "{}: {}\r\n", name, value.trim());
        }
        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }

    /// Multi-line description for logs; the body is reduced to its length.
    pub fn to_log_string(&self) -> String {
        let start = self
            .start_line()
            .unwrap_or_else(|| "<malformed>".to_string());

        let mut out = format!("Status/request line:\n\t{}\nHeaders:\n", start);
        for (name, value) in self.headers.iter() {
            let _ = writeln!(out, "\t{}: {}", name, value);
        }
        let _ = write!(out, "Body: {} bytes long, omitted in logs", self.body.len());
        out
    }

    fn start_line(&self) -> Option<String> {
        match &self.start {
            StartLine::Request {
                method,
                path,
                protocol,
            } => Some(format!("{} {} {}", method, path, protocol)),
            StartLine::Response { protocol, status } => Some(format!("{} {}", protocol, status)),
            StartLine::Malformed => None,
        }
    }
}
