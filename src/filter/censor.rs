//! Word censor for response bodies.
//!
//! Matching runs on a scanning copy of the body that is ASCII-lowercased and
//! has the inside of every `<...>` tag blanked out, so markup attributes are
//! never censored. Each match is overwritten with the marker at the same
//! offset in both the scanning copy and the output. The two buffers are
//! edited in lockstep, which keeps their offsets identical even when the
//! marker and the word differ in length.

/// Redacts configured words, case-insensitively, outside of markup tags.
#[derive(Debug, Clone)]
pub struct WordCensor {
    words: Vec<Vec<u8>>,
    marker: Vec<u8>,
}

impl WordCensor {
    /// Words are trimmed and lowercased; blank entries are ignored.
    pub fn new<I, S>(words: I, marker: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_ascii_lowercase().into_bytes())
            .filter(|word| !word.is_empty())
            .collect();
        Self {
            words,
            marker: marker.into().into_bytes(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Returns the censored copy of `text`.
    pub fn censor(&self, text: &[u8]) -> Vec<u8> {
        let mut output = text.to_vec();
        if self.words.is_empty() {
            return output;
        }

        let mut scan = text.to_ascii_lowercase();
        blank_tags(&mut scan);

        for word in &self.words {
            let mut from = 0;
            while let Some(offset) = find(&scan[from..], word) {
                let at = from + offset;
                let span = at..at + word.len();
                scan.splice(span.clone(), self.marker.iter().copied());
                output.splice(span, self.marker.iter().copied());
                from = at + self.marker.len();
            }
        }

        output
    }
}

/// Whether a `Content-Type` value names a body the censor should touch.
pub fn is_text_like(content_type: &str) -> bool {
    let content_type = content_type.trim().to_ascii_lowercase();
    content_type.starts_with("text/")
        || ["html", "xml", "json", "javascript"]
            .iter()
            .any(|kind| content_type.contains(kind))
}

/// Replace everything from a `<` up to (not including) the next `>` with spaces.
fn blank_tags(scan: &mut [u8]) {
    let mut in_tag = false;
    for byte in scan.iter_mut() {
        if *byte == b'<' {
            in_tag = true;
        } else if *byte == b'>' {
            in_tag = false;
        }
        if in_tag {
            *byte = b' ';
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
