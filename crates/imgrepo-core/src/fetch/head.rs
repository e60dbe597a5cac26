//! Track the status line and `Content-Length` of the response being received.
//!
//! curl hands header lines to the header callback one at a time, including
//! those of intermediate redirect responses; each new status line starts over.

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ResponseHead {
    pub(crate) status: Option<u32>,
    pub(crate) content_length: Option<u64>,
}

impl ResponseHead {
    /// Feed one raw header line.
    pub(crate) fn observe(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            *self = ResponseHead {
                status: parse_status(line),
                content_length: None,
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                self.content_length = value.trim().parse::<u64>().ok();
            }
        }
    }

    pub(crate) fn is_success(&self) -> bool {
        matches!(self.status, Some(200..=299))
    }
}

fn parse_status(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
