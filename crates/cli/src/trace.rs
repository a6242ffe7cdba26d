//! Trace file parsing.
//!
//! One operation per line, `#` starts a comment:
//!
//! ```text
//! R 0x10        # read
//! W 0x10 42     # write
//! INV 0x10      # invalidate the block
//! FLUSH         # invalidate everything
//! WAIT          # let outstanding fills complete
//! ```

use cachesim_core::common::addr::Address;
use cachesim_core::{CacheRequest, RequestError};
use thiserror::Error;

/// One trace operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceOp {
    /// A CPU read or write.
    Request(CacheRequest),
    /// Invalidate the block containing the address.
    Invalidate(Address),
    /// Invalidate every resident block.
    Flush,
    /// Complete every outstanding fill.
    Wait,
}

/// A trace line that could not be parsed.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The operands did not validate.
    #[error("line {line}: {source}")]
    Request {
        /// 1-based line number.
        line: usize,
        /// Validation failure.
        #[source]
        source: RequestError,
    },

    /// The line does not match any operation.
    #[error("line {line}: expected {expected}, got `{text}`")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// Expected form.
        expected: &'static str,
        /// Offending text.
        text: String,
    },
}

/// Parses a whole trace, returning each operation with its line number.
///
/// # Errors
///
/// Returns the first [`TraceError`] encountered.
pub fn parse(text: &str) -> Result<Vec<(usize, TraceOp)>, TraceError> {
    let mut ops = Vec::new();
    for (n, raw) in text.lines().enumerate() {
        let line = n + 1;
        let body = raw.split('#').next().unwrap_or_default().trim();
        if body.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = body.split_whitespace().collect();
        let malformed = |expected| TraceError::Malformed {
            line,
            expected,
            text: body.to_string(),
        };
        let request = |source| TraceError::Request { line, source };

        let op = match (tokens[0].to_ascii_uppercase().as_str(), &tokens[1..]) {
            ("R" | "READ", [addr]) => {
                TraceOp::Request(CacheRequest::parse(addr, "READ", None).map_err(request)?)
            }
            ("W" | "WRITE", [addr, value]) => TraceOp::Request(
                CacheRequest::parse(addr, "WRITE", Some(*value)).map_err(request)?,
            ),
            ("INV" | "INVALIDATE", [addr]) => TraceOp::Invalidate(
                CacheRequest::parse(addr, "READ", None)
                    .map_err(request)?
                    .address,
            ),
            ("FLUSH", []) => TraceOp::Flush,
            ("WAIT", []) => TraceOp::Wait,
            ("R" | "READ", _) => return Err(malformed("`R <address>`")),
            ("W" | "WRITE", _) => return Err(malformed("`W <address> <value>`")),
            ("INV" | "INVALIDATE", _) => return Err(malformed("`INV <address>`")),
            _ => return Err(malformed("R, W, INV, FLUSH or WAIT")),
        };
        ops.push((line, op));
    }
    Ok(ops)
}
