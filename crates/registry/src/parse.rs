//! Textual value parsing.
//!
//! Integers accept decimal or `0x` hex digits with an optional `k`, `m`, `g`
//! or `t` binary suffix. A leading minus sign is only accepted by signed
//! types. Booleans accept `true`, `false`, `1` and `0` in any case.

use bytesize::ByteSize;
use thiserror::Error;

use crate::core::{FlagType, FlagValue};

const K: u64 = 1024;

/// Why a textual value could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
	#[error("'{text}' is not a valid {expected} value")]
	Invalid { text: String, expected: &'static str },
	#[error("'{text}' is out of range for {expected}")]
	Overflow { text: String, expected: &'static str },
}

impl ParseError {
	fn invalid(text: &str, ty: FlagType) -> Self {
		Self::Invalid {
			text: text.to_string(),
			expected: ty.name(),
		}
	}

	fn overflow(text: &str, ty: FlagType) -> Self {
		Self::Overflow {
			text: text.to_string(),
			expected: ty.name(),
		}
	}
}

pub fn parse_bool(text: &str) -> Option<bool> {
	if text.eq_ignore_ascii_case("true") || text == "1" {
		Some(true)
	} else if text.eq_ignore_ascii_case("false") || text == "0" {
		Some(false)
	} else {
		None
	}
}

/// Parses an unsigned magnitude: digits or `0x` hex, then at most one suffix.
pub fn parse_magnitude(text: &str) -> Option<u64> {
	if !text.starts_with(|c: char| c.is_ascii_digit()) {
		return None;
	}
	let (digits, radix) = match text.get(..2) {
		Some("0x" | "0X") => (&text[2..], 16),
		_ => (text, 10),
	};
	let end = digits
		.find(|c: char| !c.is_digit(radix))
		.unwrap_or(digits.len());
	let (number, suffix) = digits.split_at(end);
	if number.is_empty() {
		return None;
	}
	let n = u64::from_str_radix(number, radix).ok()?;
	let scale = match suffix {
		"" => 1,
		"k" | "K" => K,
		"m" | "M" => K * K,
		"g" | "G" => K * K * K,
		"t" | "T" => K * K * K * K,
		_ => return None,
	};
	n.checked_mul(scale)
}

/// Parses an optionally negative integer into `i128` for range checks.
pub fn parse_signed(text: &str) -> Option<i128> {
	match text.strip_prefix('-') {
		Some(rest) => parse_magnitude(rest).map(|n| -i128::from(n)),
		None => parse_magnitude(text).map(i128::from),
	}
}

/// Converts `text` into a value of the numeric or boolean type `ty`.
///
/// String types are returned as-is, with the empty string as the null value.
pub fn parse_value(ty: FlagType, text: &str) -> Result<FlagValue, ParseError> {
	let invalid = || ParseError::invalid(text, ty);
	let overflow = || ParseError::overflow(text, ty);
	let unsigned = || parse_magnitude(text).ok_or_else(invalid);
	let signed = || parse_signed(text).ok_or_else(invalid);

	Ok(match ty {
		FlagType::Bool => FlagValue::Bool(parse_bool(text).ok_or_else(invalid)?),
		FlagType::Int => FlagValue::Int(i32::try_from(signed()?).map_err(|_| overflow())?),
		FlagType::Uint => FlagValue::Uint(u32::try_from(unsigned()?).map_err(|_| overflow())?),
		FlagType::Intx => FlagValue::Intx(isize::try_from(signed()?).map_err(|_| overflow())?),
		FlagType::Uintx => FlagValue::Uintx(usize::try_from(unsigned()?).map_err(|_| overflow())?),
		FlagType::Uint64 => FlagValue::Uint64(unsigned()?),
		FlagType::SizeT => {
			let bytes = unsigned()?;
			if usize::try_from(bytes).is_err() {
				return Err(overflow());
			}
			FlagValue::SizeT(ByteSize(bytes))
		}
		FlagType::Double => FlagValue::Double(text.parse::<f64>().map_err(|_| invalid())?),
		FlagType::Ccstr | FlagType::CcstrList => {
			FlagValue::Str((!text.is_empty()).then(|| text.to_string()))
		}
	})
}
