//! Move parameter types and the mapping from a type tag to an input rule.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a full account address including the `0x` prefix.
pub const ADDRESS_LENGTH: usize = 66;

/// Move types a caller can supply as an entry-function argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MoveType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
    Address,
    Signer,
    Vector { element_type: Box<MoveType> },
    Other { name: String },
}

impl MoveType {
    pub fn from_type_string(type_str: &str) -> Self {
        let trimmed = type_str.trim();
        match trimmed {
            "bool" => MoveType::Bool,
            "u8" => MoveType::U8,
            "u16" => MoveType::U16,
            "u32" => MoveType::U32,
            "u64" => MoveType::U64,
            "u128" => MoveType::U128,
            "u256" => MoveType::U256,
            "address" => MoveType::Address,
            "signer" | "&signer" => MoveType::Signer,
            _ => {
                if let Some(inner) = Self::extract_generic(trimmed, "vector") {
                    return MoveType::Vector {
                        element_type: Box::new(Self::from_type_string(&inner)),
                    };
                }
                MoveType::Other {
                    name: trimmed.to_string(),
                }
            }
        }
    }

    fn extract_generic(type_str: &str, wrapper: &str) -> Option<String> {
        let prefix = format!("{}<", wrapper);
        if type_str.starts_with(&prefix) && type_str.ends_with('>') {
            Some(type_str[prefix.len()..type_str.len() - 1].to_string())
        } else {
            None
        }
    }

    /// Bit width of an unsigned integer type, `None` for everything else.
    pub fn integer_bits(&self) -> Option<u32> {
        match self {
            MoveType::U8 => Some(8),
            MoveType::U16 => Some(16),
            MoveType::U32 => Some(32),
            MoveType::U64 => Some(64),
            MoveType::U128 => Some(128),
            MoveType::U256 => Some(256),
            _ => None,
        }
    }

    pub fn is_byte_vector(&self) -> bool {
        matches!(self, MoveType::Vector { element_type } if **element_type == MoveType::U8)
    }

    pub fn display_name(&self) -> String {
        match self {
            MoveType::Bool => "bool".to_string(),
            MoveType::U8 => "u8".to_string(),
            MoveType::U16 => "u16".to_string(),
            MoveType::U32 => "u32".to_string(),
            MoveType::U64 => "u64".to_string(),
            MoveType::U128 => "u128".to_string(),
            MoveType::U256 => "u256".to_string(),
            MoveType::Address => "address".to_string(),
            MoveType::Signer => "&signer".to_string(),
            MoveType::Vector { element_type } => {
                format!("vector<{}>", element_type.display_name())
            }
            MoveType::Other { name } => name.clone(),
        }
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// True for the implicit signer parameter the wallet supplies.
pub fn is_signer_tag(type_tag: &str) -> bool {
    matches!(MoveType::from_type_string(type_tag), MoveType::Signer)
}

/// The kind of input a presentation layer renders for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Integer,
    Boolean,
    Address,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub input_kind: InputKind,
    pub placeholder: String,
    pub hint: String,
}

pub fn classify(type_tag: &str) -> Classification {
    let move_type = MoveType::from_type_string(type_tag);

    if let Some(bits) = move_type.integer_bits() {
        return Classification {
            input_kind: InputKind::Integer,
            placeholder: "Enter a non-negative number".to_string(),
            hint: format!(
                "Unsigned {}-bit integer (0 to {})",
                bits,
                max_for_bits(bits)
            ),
        };
    }

    match move_type {
        MoveType::Bool => Classification {
            input_kind: InputKind::Boolean,
            placeholder: "true/false".to_string(),
            hint: "Boolean value: true or false".to_string(),
        },
        MoveType::Address => Classification {
            input_kind: InputKind::Address,
            placeholder: "0x1234...".to_string(),
            hint: format!(
                "A 32-byte address starting with 0x ({} characters total)",
                ADDRESS_LENGTH
            ),
        },
        ref t if t.is_byte_vector() => Classification {
            input_kind: InputKind::Text,
            placeholder: "Enter text value".to_string(),
            hint: "Byte string, entered as text".to_string(),
        },
        other => Classification {
            input_kind: InputKind::Text,
            placeholder: format!("Enter {} value", other.display_name()),
            hint: format!("Value of type {}", other.display_name()),
        },
    }
}

/// Outcome of validating one raw parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }
}

pub fn validate(value: &str, type_tag: &str) -> ValidationResult {
    let move_type = MoveType::from_type_string(type_tag);

    if value.is_empty() {
        return if move_type == MoveType::Bool {
            ValidationResult::ok()
        } else {
            ValidationResult::invalid("Required field")
        };
    }

    match move_type {
        MoveType::Address => validate_address(value),
        MoveType::Bool => match parse_bool(value) {
            Some(_) => ValidationResult::ok(),
            None => ValidationResult::invalid("Must be true or false"),
        },
        ref t => match t.integer_bits() {
            Some(bits) => validate_integer(value, bits),
            None => ValidationResult::ok(),
        },
    }
}

pub fn validate_address(value: &str) -> ValidationResult {
    if !value.starts_with("0x") || value.len() != ADDRESS_LENGTH {
        return ValidationResult::invalid(format!(
            "Address must start with 0x and be {} characters long",
            ADDRESS_LENGTH
        ));
    }
    if !value[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return ValidationResult::invalid("Address must contain only hex digits after 0x");
    }
    ValidationResult::ok()
}

fn validate_integer(value: &str, bits: u32) -> ValidationResult {
    match parse_unsigned(value) {
        None => ValidationResult::invalid("Must be a non-negative integer"),
        Some(n) if n > max_for_bits(bits) => {
            ValidationResult::invalid(format!("Must be at most {}", max_for_bits(bits)))
        }
        Some(_) => ValidationResult::ok(),
    }
}

/// Parses a plain decimal digit string into an arbitrary-precision integer.
pub fn parse_unsigned(value: &str) -> Option<BigUint> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(value.as_bytes(), 10)
}

/// Empty input counts as `false`, matching an unticked checkbox.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" => Some(false),
        "true" => Some(true),
        _ => None,
    }
}

pub fn max_for_bits(bits: u32) -> BigUint {
    (BigUint::from(1u8) << bits) - BigUint::from(1u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> String {
        format!("0x{}", "ab".repeat(32))
    }

    #[test]
    fn classifies_by_first_matching_rule() {
        for tag in ["u8", "u16", "u32", "u64", "u128", "u256"] {
            assert_eq!(classify(tag).input_kind, InputKind::Integer, "{}", tag);
        }
        assert_eq!(classify("bool").input_kind, InputKind::Boolean);
        assert_eq!(classify("address").input_kind, InputKind::Address);
        assert_eq!(classify("vector<u8>").input_kind, InputKind::Text);
        assert_eq!(classify("0x1::string::String").input_kind, InputKind::Text);
    }

    #[test]
    fn hints_mention_bounds() {
        assert!(classify("u8").hint.contains("255"));
        assert!(classify("address").hint.contains("66"));
        assert_eq!(classify("0x1::coin::Coin").hint, "Value of type 0x1::coin::Coin");
    }

    #[test]
    fn narrow_widths_accept_max_and_reject_max_plus_one() {
        let cases = [
            ("u8", "255", "256"),
            ("u16", "65535", "65536"),
            ("u32", "4294967295", "4294967296"),
        ];
        for (tag, max, over) in cases {
            assert!(validate(max, tag).valid, "{} should accept {}", tag, max);
            assert!(!validate(over, tag).valid, "{} should reject {}", tag, over);
        }
    }

    #[test]
    fn wide_widths_enforce_exact_bounds() {
        assert!(validate("18446744073709551615", "u64").valid);
        assert!(!validate("18446744073709551616", "u64").valid);

        let u128_max = u128::MAX.to_string();
        assert!(validate(&u128_max, "u128").valid);
        let over = (BigUint::from(u128::MAX) + 1u8).to_string();
        assert!(!validate(&over, "u128").valid);

        let u256_max = max_for_bits(256).to_string();
        assert!(validate(&u256_max, "u256").valid);
        let over = (max_for_bits(256) + 1u8).to_string();
        assert!(!validate(&over, "u256").valid);
    }

    #[test]
    fn integers_reject_signs_and_garbage() {
        assert!(!validate("-1", "u64").valid);
        assert!(!validate("12abc", "u8").valid);
        assert!(!validate("1.5", "u32").valid);
        assert!(!validate(" 7", "u32").valid);
    }

    #[test]
    fn empty_value_only_allowed_for_bool() {
        assert!(validate("", "bool").valid);
        assert_eq!(
            validate("", "u64").error.as_deref(),
            Some("Required field")
        );
        assert!(!validate("", "address").valid);
        assert!(!validate("", "vector<u8>").valid);
    }

    #[test]
    fn address_format() {
        assert!(validate(&addr(), "address").valid);
        assert!(!validate("0x123", "address").valid);
        assert!(!validate(&format!("1x{}", "a".repeat(64)), "address").valid);
        assert!(!validate(&format!("0x{}", "a".repeat(65)), "address").valid);
        assert!(!validate(&format!("0x{}", "z".repeat(64)), "address").valid);
    }

    #[test]
    fn bool_values() {
        assert!(validate("true", "bool").valid);
        assert!(validate("False", "bool").valid);
        assert!(!validate("yes", "bool").valid);
    }

    #[test]
    fn parses_nested_vectors() {
        let t = MoveType::from_type_string("vector<vector<u8>>");
        assert_eq!(t.display_name(), "vector<vector<u8>>");
        assert!(!t.is_byte_vector());
        assert!(MoveType::from_type_string("vector<u8>").is_byte_vector());
        assert!(is_signer_tag("&signer"));
        assert!(!is_signer_tag("address"));
    }
}
