//! Core types: Address, U256 amounts, basis points, price scale.

use std::fmt;
use std::str::FromStr;

pub use primitive_types::U256;

/// Basis points: 1/10000 of a whole.
pub type Bps = u32;

/// Denominator for every basis-point quantity (shares, tolerance, trade cap).
pub const BPS_DENOMINATOR: Bps = 10_000;

/// Number of decimals in the fixed-point price scale.
pub const PRICE_DECIMALS: usize = 18;

/// Fixed-point scale of unit prices: a price of `price_unit()` means one unit
/// of account per smallest asset unit times `10^18`.
pub fn price_unit() -> U256 {
    U256::exp10(PRICE_DECIMALS)
}

/// `value` as a 32-byte big-endian ABI word.
pub fn uint_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// A 20-byte account/contract identity.
///
/// Assets, venues, price sources, agents and holdings are all identified by
/// an `Address`. The all-zero address is the "null" identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// An address made of one repeated byte. Handy for fixtures.
    pub const fn repeat_byte(byte: u8) -> Self {
        Address([byte; 20])
    }

    /// True for the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Build from exactly 20 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Address(arr))
    }

    /// Left-zero-padded 32-byte ABI word.
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Error parsing an [`Address`] from text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("invalid hex in address: {0}")]
    Hex(String),
    #[error("address must be 20 bytes, got {0}")]
    Length(usize),
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| AddressParseError::Hex(e.to_string()))?;
        Address::from_slice(&bytes).ok_or(AddressParseError::Length(bytes.len()))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde helpers for `U256` amounts as decimal strings.
///
/// Use with `#[serde(with = "driftguard::types::decimal")]`.
#[cfg(feature = "serde")]
pub mod decimal {
    use super::U256;

    pub fn serialize<S: serde::Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        U256::from_dec_str(s.trim()).map_err(|e| serde::de::Error::custom(format!("{e:?}")))
    }
}
