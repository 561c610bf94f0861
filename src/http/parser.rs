//! Header block parsing.
//!
//! # Responsibilities
//! - Classify the first line as request, response or malformed
//! - Split header lines at the first `:` into name and trimmed value
//!
//! # Design Decisions
//! - A first token containing `HTTP` marks a response (`HTTP/1.1 200 OK`)
//! - Only the first three request-line tokens are used
//! - Lines with no value are logged and dropped; they never fail the message

use crate::http::message::{Headers, Message, StartLine};

/// Parse a header block (terminator excluded) into a body-less message.
///
/// Returns a [`StartLine::Malformed`] message when the first line has fewer
/// than three whitespace-separated tokens.
pub fn parse_head(head: &str) -> Message {
    let mut lines = head.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

    let first = lines.next().unwrap_or_default();
    let start = match parse_start_line(first) {
        StartLine::Malformed => {
            tracing::debug!(line = %first, "Malformed start line");
            return Message::malformed();
        }
        start => start,
    };

    let mut headers = Headers::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        match parse_header_line(line) {
            Some((name, value)) => headers.insert(name, value),
            None => tracing::debug!(line = %line, "Dropping malformed header line"),
        }
    }

    Message {
        start,
        headers,
        body: Vec::new(),
    }
}

pub fn parse_start_line(line: &str) -> StartLine {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return StartLine::Malformed;
    }

    if tokens[0].contains("HTTP") {
        StartLine::Response {
            protocol: tokens[0].to_string(),
            status: tokens[1..].join(" "),
        }
    } else {
        StartLine::Request {
            method: tokens[0].to_string(),
            path: tokens[1].to_string(),
            protocol: tokens[2].to_string(),
        }
    }
}

/// `Name: value` → (`Name`, `value`); `None` when there is no value.
fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some((name, value))
    }
}
