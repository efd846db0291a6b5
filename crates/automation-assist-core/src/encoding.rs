//! Type-tag driven BCS encoding of entry-function arguments.

use crate::error::{AssistError, Result};
use crate::types::{parse_bool, parse_unsigned, MoveType};
use num_bigint::BigUint;
use serde::Serialize;

/// Converts one validated raw value into its binary argument form.
pub trait ArgumentEncoder {
    fn encode(&self, value: &str, type_tag: &str) -> Result<Vec<u8>>;
}

/// Encodes arguments the way the Move VM expects them: fixed-width
/// little-endian integers, one-byte booleans, raw 32-byte addresses and
/// length-prefixed byte strings for everything textual.
#[derive(Debug, Clone, Copy, Default)]
pub struct BcsEncoder;

impl ArgumentEncoder for BcsEncoder {
    fn encode(&self, value: &str, type_tag: &str) -> Result<Vec<u8>> {
        let move_type = MoveType::from_type_string(type_tag);
        match move_type {
            MoveType::Address => address_bytes(value).map(|b| b.to_vec()),
            MoveType::Bool => {
                let b = parse_bool(value)
                    .ok_or_else(|| AssistError::Encoding(format!("'{}' is not a bool", value)))?;
                to_bcs(&b)
            }
            MoveType::U8 => to_bcs(&narrow::<u8>(value, type_tag)?),
            MoveType::U16 => to_bcs(&narrow::<u16>(value, type_tag)?),
            MoveType::U32 => to_bcs(&narrow::<u32>(value, type_tag)?),
            MoveType::U64 => to_bcs(&narrow::<u64>(value, type_tag)?),
            MoveType::U128 => to_bcs(&narrow::<u128>(value, type_tag)?),
            MoveType::U256 => u256_le(&big(value, type_tag)?).map(|b| b.to_vec()),
            MoveType::Signer => Err(AssistError::Encoding(
                "signer arguments are supplied by the wallet".to_string(),
            )),
            MoveType::Vector { .. } | MoveType::Other { .. } => to_bcs(value),
        }
    }
}

fn to_bcs<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    bcs::to_bytes(value).map_err(|e| AssistError::Encoding(e.to_string()))
}

fn big(value: &str, type_tag: &str) -> Result<BigUint> {
    parse_unsigned(value)
        .ok_or_else(|| AssistError::Encoding(format!("'{}' is not a valid {}", value, type_tag)))
}

fn narrow<T>(value: &str, type_tag: &str) -> Result<T>
where
    T: TryFrom<BigUint>,
{
    T::try_from(big(value, type_tag)?)
        .map_err(|_| AssistError::Encoding(format!("'{}' does not fit in {}", value, type_tag)))
}

pub fn u256_le(n: &BigUint) -> Result<[u8; 32]> {
    let bytes = n.to_bytes_le();
    if bytes.len() > 32 {
        return Err(AssistError::Encoding(format!("{} does not fit in u256", n)));
    }
    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(&bytes);
    Ok(out)
}

/// Decodes a `0x`-prefixed 64-digit hex address into its raw bytes.
pub fn address_bytes(value: &str) -> Result<[u8; 32]> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| AssistError::Encoding(format!("address '{}' lacks 0x prefix", value)))?;
    let decoded = hex::decode(digits).map_err(|e| AssistError::Encoding(e.to_string()))?;
    decoded
        .try_into()
        .map_err(|_| AssistError::Encoding(format!("address '{}' is not 32 bytes", value)))
}
