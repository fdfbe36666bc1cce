//! Incremental Server-Sent-Events parser.
//!
//! Bytes are fed in whatever pieces the transport hands out. Incomplete lines
//! stay in a residual buffer until the rest arrives, so event boundaries may
//! fall anywhere, including inside a multi-byte UTF-8 sequence.

/// One dispatched event block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// Value of the `event:` field, `None` when the block had none.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

impl SseEvent {
    /// Event kind, defaulting to `message` as the SSE format does.
    pub fn kind(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }
}

#[derive(Debug, Default)]
pub struct SseParser {
    residual: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    started: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes a chunk and returns every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.residual.extend_from_slice(chunk);

        let mut events = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.residual[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            let mut line = &self.residual[consumed..end];
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
            let line = String::from_utf8_lossy(line).into_owned();
            consumed = end + 1;

            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        self.residual.drain(..consumed);

        events
    }

    /// Bytes received but not yet part of a complete line.
    pub fn pending(&self) -> usize {
        self.residual.len()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => {
                self.event = Some(value.to_string());
                self.started = true;
            }
            "data" => {
                self.data.push(value.to_string());
                self.started = true;
            }
            // `id`, `retry` and unknown fields carry nothing we act on.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if !std::mem::take(&mut self.started) {
            return None;
        }
        Some(SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}
