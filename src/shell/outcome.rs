//! Invocation results.

/// Value produced by capturing one output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Captured {
    /// Decoded and normalized text (the default).
    Text(String),
    /// Raw bytes from a transform.
    Bytes(Vec<u8>),
    /// Structured data from a transform.
    Json(serde_json::Value),
}

impl Captured {
    /// The text, if this is [`Captured::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The JSON value, if this is [`Captured::Json`].
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The bytes, if this is [`Captured::Bytes`].
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<String> for Captured {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Terminal result of a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Exit code (None if killed by signal).
    pub code: Option<i32>,

    /// Name of the terminating signal, e.g. `SIGTERM`.
    pub signal: Option<String>,

    /// Captured stdout, present only when capture was requested.
    pub stdout: Option<Captured>,

    /// Captured stderr, present only when capture was requested.
    pub stderr: Option<Captured>,
}

impl Outcome {
    /// Whether the process exited with code 0 and no signal.
    pub fn success(&self) -> bool {
        is_success(self.code, self.signal.as_deref())
    }

    /// Captured stdout as text, if it was captured as text.
    pub fn stdout_text(&self) -> Option<&str> {
        self.stdout.as_ref().and_then(Captured::as_text)
    }

    /// Captured stderr as text, if it was captured as text.
    pub fn stderr_text(&self) -> Option<&str> {
        self.stderr.as_ref().and_then(Captured::as_text)
    }
}

/// Success means code 0 and no terminating signal.
pub(crate) fn is_success(code: Option<i32>, signal: Option<&str>) -> bool {
    code == Some(0) && signal.is_none()
}
