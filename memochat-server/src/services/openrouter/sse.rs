//! Incremental decoder for the upstream `text/event-stream` body.
//!
//! Network chunks may end anywhere, including inside a UTF-8 sequence, so
//! bytes are buffered until a full `\n`-terminated line is available.

use tracing::debug;

use super::types::StreamChunk;

/// A decoded upstream event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// A non-empty content fragment.
    Delta(String),
    /// The `[DONE]` sentinel.
    Done,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk and return the frames completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(frame) = parse_line(&String::from_utf8_lossy(&line[..pos])) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a trailing line that was never newline-terminated.
    pub fn finish(&mut self) -> Vec<SseFrame> {
        let rest = std::mem::take(&mut self.buf);
        parse_line(&String::from_utf8_lossy(&rest)).into_iter().collect()
    }
}

fn parse_line(line: &str) -> Option<SseFrame> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with(':') {
        return None;
    }
    let data = line.strip_prefix("data:")?;
    let data = data.strip_prefix(' ').unwrap_or(data);
    if data == "[DONE]" {
        return Some(SseFrame::Done);
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk.into_content().map(SseFrame::Delta),
        Err(e) => {
            debug!(error = %e, len = data.len(), "skipping unparsable upstream frame");
            None
        }
    }
}
