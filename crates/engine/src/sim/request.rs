//! Request intake and validation.
//!
//! Raw requests arrive from the presentation layer with loosely typed fields (form
//! inputs produce strings as often as numbers). They are validated into a typed
//! [`CacheRequest`] before any address decoding happens, so malformed input is
//! reported with a [`RequestError`] distinct from the engine's per-request errors.

use serde::Deserialize;
use serde_json::Value;

use crate::common::addr::Address;
use crate::common::data::{AccessType, Word};
use crate::common::error::RequestError;

/// A validated CPU request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheRequest {
    /// Byte address.
    pub address: Address,
    /// Read or write.
    pub access: AccessType,
    /// Value to store; present exactly for writes.
    pub data: Option<Word>,
}

impl CacheRequest {
    /// A read of `address`.
    pub const fn read(address: u64) -> Self {
        Self {
            address: Address::new(address),
            access: AccessType::Read,
            data: None,
        }
    }

    /// A write of `value` to `address`.
    pub const fn write(address: u64, value: Word) -> Self {
        Self {
            address: Address::new(address),
            access: AccessType::Write,
            data: Some(value),
        }
    }

    /// Validates textual fields, as typed into a form or a trace file.
    ///
    /// Numbers may be decimal or `0x`-prefixed hexadecimal.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] if the address or data is not a non-negative
    /// integer, the action is unknown, or a write carries no data.
    pub fn parse(address: &str, action: &str, data: Option<&str>) -> Result<Self, RequestError> {
        let address = parse_unsigned(address)
            .ok_or_else(|| RequestError::InvalidAddress(address.trim().to_string()))?;
        match parse_action(action)? {
            AccessType::Read => Ok(Self::read(address)),
            AccessType::Write => {
                let raw = data.ok_or(RequestError::WriteDataArity(0))?;
                let value = parse_unsigned(raw)
                    .ok_or_else(|| RequestError::InvalidData(raw.trim().to_string()))?;
                Ok(Self::write(address, value))
            }
        }
    }
}

/// A request as received on the wire, before validation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequest {
    /// Address as a JSON number or numeric string.
    pub address: Value,
    /// `READ` or `WRITE`, any case.
    #[serde(alias = "operation")]
    pub action: String,
    /// Singleton sequence for writes; ignored for reads.
    #[serde(default)]
    pub data: Vec<Value>,
}

impl TryFrom<RawRequest> for CacheRequest {
    type Error = RequestError;

    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let address = value_to_unsigned(&raw.address)
            .ok_or_else(|| RequestError::InvalidAddress(value_text(&raw.address)))?;
        match parse_action(&raw.action)? {
            AccessType::Read => Ok(Self::read(address)),
            AccessType::Write => {
                let [value] = raw.data.as_slice() else {
                    return Err(RequestError::WriteDataArity(raw.data.len()));
                };
                let word = value_to_unsigned(value)
                    .ok_or_else(|| RequestError::InvalidData(value_text(value)))?;
                Ok(Self::write(address, word))
            }
        }
    }
}

fn parse_action(action: &str) -> Result<AccessType, RequestError> {
    match action.trim().to_ascii_uppercase().as_str() {
        "READ" | "R" | "RD" => Ok(AccessType::Read),
        "WRITE" | "W" | "WR" => Ok(AccessType::Write),
        _ => Err(RequestError::UnknownAction(action.to_string())),
    }
}

fn parse_unsigned(text: &str) -> Option<u64> {
    let text = text.trim();
    if let Some(hex) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok();
    }
    text.parse().ok()
}

fn value_to_unsigned(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_unsigned(s),
        _ => None,
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
