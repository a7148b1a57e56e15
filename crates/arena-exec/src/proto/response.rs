use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Reply began with the `=` marker.
    Success,
    /// Reply arrived but did not begin with `=`.
    Failure,
    /// No reply: the engine exited, the pipe closed, or the read timed out.
    Broken,
}

/// One framed reply from an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub kind: ResponseKind,
    /// Numeric command id echoed after the marker, if any.
    pub id: Option<u32>,
    /// Text after the marker and id, trimmed. For [`ResponseKind::Broken`]
    /// this is a description of what went wrong.
    pub payload: String,
}

impl Response {
    pub fn success(payload: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Success,
            id: None,
            payload: payload.into(),
        }
    }

    pub fn broken(reason: impl Into<String>) -> Self {
        Self {
            kind: ResponseKind::Broken,
            id: None,
            payload: reason.into(),
        }
    }

    /// Classify a raw reply with its terminator already removed.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (kind, rest) = match raw.chars().next() {
            Some('=') => (ResponseKind::Success, &raw[1..]),
            Some('?') => (ResponseKind::Failure, &raw[1..]),
            _ => {
                return Self {
                    kind: ResponseKind::Failure,
                    id: None,
                    payload: raw.to_string(),
                };
            }
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits > 0 { rest[..digits].parse().ok() } else { None };

        Self {
            kind,
            id,
            payload: rest[digits..].trim().to_string(),
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.kind == ResponseKind::Success
    }

    #[inline]
    pub fn is_broken(&self) -> bool {
        self.kind == ResponseKind::Broken
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            ResponseKind::Success => "=",
            ResponseKind::Failure => "?",
            ResponseKind::Broken => "!",
        };
        match self.id {
            Some(id) => write!(f, "{marker}{id} {}", self.payload),
            None => write!(f, "{marker} {}", self.payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_strips_marker() {
        let r = Response::parse("= e5\n");
        assert!(r.is_success());
        assert_eq!(r.id, None);
        assert_eq!(r.payload, "e5");
    }

    #[test]
    fn numeric_id_is_split_off() {
        let r = Response::parse("=12 white_or_draw a1 4 1500");
        assert_eq!(r.id, Some(12));
        assert_eq!(r.payload, "white_or_draw a1 4 1500");
    }

    #[test]
    fn bare_marker_has_empty_payload() {
        let r = Response::parse("=");
        assert!(r.is_success());
        assert_eq!(r.payload, "");
    }

    #[test]
    fn failure_markers() {
        let r = Response::parse("? unknown command");
        assert_eq!(r.kind, ResponseKind::Failure);
        assert_eq!(r.payload, "unknown command");

        let r = Response::parse("segfault in board.h");
        assert_eq!(r.kind, ResponseKind::Failure);
        assert_eq!(r.payload, "segfault in board.h");
    }

    #[test]
    fn multi_line_payload_is_kept() {
        let r = Response::parse("= line one\nline two");
        assert_eq!(r.payload, "line one\nline two");
    }
}
