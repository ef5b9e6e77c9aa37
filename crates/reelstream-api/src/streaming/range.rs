//! `Range` header resolution.
//!
//! Only a single `bytes=<start>-<end>` range is honoured; `end` may be
//! omitted. Suffix ranges (`bytes=-500`) and multi-range requests are
//! treated as unsatisfiable.

use axum::http::StatusCode;
use thiserror::Error;

/// Inclusive byte interval `[start, end]` of content of length `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteInterval {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl ByteInterval {
    /// Never zero: an interval always covers at least one byte.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value, e.g. `bytes 0-99/1000`.
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeDecision {
    /// No range requested, or empty content: send everything with 200.
    Full { total: u64 },
    /// Range requested and satisfiable: send the interval with 206.
    Partial(ByteInterval),
}

impl RangeDecision {
    pub fn start(&self) -> u64 {
        match self {
            RangeDecision::Full { .. } => 0,
            RangeDecision::Partial(interval) => interval.start,
        }
    }

    /// Number of body bytes to send.
    pub fn len(&self) -> u64 {
        match self {
            RangeDecision::Full { total } => *total,
            RangeDecision::Partial(interval) => interval.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> StatusCode {
        match self {
            RangeDecision::Full { .. } => StatusCode::OK,
            RangeDecision::Partial(_) => StatusCode::PARTIAL_CONTENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Requested range not satisfiable for {total} bytes")]
pub struct RangeNotSatisfiable {
    pub total: u64,
}

fn parse_offset(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Decide what to send for an optional `Range` header over content of `size` bytes.
pub fn resolve(header: Option<&str>, size: u64) -> Result<RangeDecision, RangeNotSatisfiable> {
    let unsatisfiable = RangeNotSatisfiable { total: size };

    // Empty content has no valid Content-Range; it is always served whole.
    if size == 0 {
        return Ok(RangeDecision::Full { total: 0 });
    }

    let Some(header) = header else {
        return Ok(RangeDecision::Full { total: size });
    };

    let byte_range = header
        .trim()
        .strip_prefix("bytes=")
        .ok_or(unsatisfiable)?;
    if byte_range.contains(',') {
        return Err(unsatisfiable);
    }

    let (start, end) = byte_range.split_once('-').ok_or(unsatisfiable)?;
    let start = parse_offset(start).ok_or(unsatisfiable)?;
    let end = if end.trim().is_empty() {
        None
    } else {
        Some(parse_offset(end).ok_or(unsatisfiable)?)
    };

    if start >= size {
        return Err(unsatisfiable);
    }

    let end = match end {
        Some(end) if end < start => return Err(unsatisfiable),
        Some(end) => end.min(size - 1),
        None => size - 1,
    };

    Ok(RangeDecision::Partial(ByteInterval {
        start,
        end,
        total: size,
    }))
}
