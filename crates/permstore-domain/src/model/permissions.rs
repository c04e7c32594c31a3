//! Fixed-width permission bit vectors.
//!
//! A permission vector has 32 bits. The all-zero vector is never stored:
//! "no permission" is `None`, so every `Permissions` value grants at least
//! one bit. This is enforced by the `NonZeroU32` representation, which also
//! keeps `Option<Permissions>` at four bytes.
//!
//! The textual form used by the storage layer is a 32 character string of
//! `0`/`1`, where character `i` is bit `i`.

use std::fmt;
use std::num::NonZeroU32;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Offset of a single permission bit (0..32).
pub type Bit = u8;

/// Number of bits in a permission vector.
pub const BIT_COUNT: usize = 32;

/// Immutable, non-empty 32-bit permission vector.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permissions(NonZeroU32);

impl Permissions {
    /// Every bit set.
    pub const FULL: Permissions = Permissions(NonZeroU32::MAX);

    /// Wraps a raw bit mask. Returns `None` for zero.
    pub fn from_bits(bits: u32) -> Option<Self> {
        NonZeroU32::new(bits).map(Self)
    }

    /// Returns the raw bit mask.
    pub fn bits(self) -> u32 {
        self.0.get()
    }

    /// Returns whether `bit` is set. Offsets outside the vector are never set.
    pub fn has(self, bit: Bit) -> bool {
        usize::from(bit) < BIT_COUNT && self.bits() & (1 << bit) != 0
    }

    /// Parses the storage representation.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBitPattern` unless the text matches
    /// `^[0-1]{32}$`. The all-zero string parses to `Ok(None)`.
    pub fn parse(text: &str) -> DomainResult<Option<Self>> {
        if text.len() != BIT_COUNT {
            return Err(DomainError::InvalidBitPattern {
                pattern: text.to_string(),
            });
        }
        let mut bits = 0u32;
        for (i, c) in text.bytes().enumerate() {
            match c {
                b'1' => bits |= 1 << i,
                b'0' => {}
                _ => {
                    return Err(DomainError::InvalidBitPattern {
                        pattern: text.to_string(),
                    })
                }
            }
        }
        Ok(Self::from_bits(bits))
    }

    /// Bitwise OR across all inputs, starting from all-zero.
    ///
    /// Returns `None` when nothing is granted, including for an empty input.
    pub fn merge<I>(vectors: I) -> Option<Self>
    where
        I: IntoIterator<Item = Option<Permissions>>,
    {
        let bits = vectors
            .into_iter()
            .flatten()
            .fold(0u32, |acc, p| acc | p.bits());
        Self::from_bits(bits)
    }

    /// Returns a copy of `perms` with `bit` forced on.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::BitOutOfRange` for offsets of 32 and above.
    pub fn set(perms: Option<Self>, bit: Bit) -> DomainResult<Self> {
        if usize::from(bit) >= BIT_COUNT {
            return Err(DomainError::BitOutOfRange { bit });
        }
        let bits = perms.map_or(0, Self::bits) | (1 << bit);
        Self::from_bits(bits).ok_or(DomainError::BitOutOfRange { bit })
    }

    /// Returns a copy of `perms` with `bit` forced off.
    pub fn unset(perms: Option<Self>, bit: Bit) -> Option<Self> {
        let base = perms?.bits();
        if usize::from(bit) >= BIT_COUNT {
            return perms;
        }
        Self::from_bits(base & !(1 << bit))
    }

    /// Applies a change pattern to `perms`.
    ///
    /// Position `i` of the pattern forces bit `i` on (`'1'`), off (`'0'`) or
    /// leaves it untouched (anything else, conventionally `'.'`). Positions
    /// beyond the pattern are untouched; characters after the 32nd are ignored.
    pub fn change(perms: Option<Self>, pattern: &str) -> Option<Self> {
        let mut bits = perms.map_or(0, Self::bits);
        for (i, c) in pattern.bytes().take(BIT_COUNT).enumerate() {
            match c {
                b'1' => bits |= 1 << i,
                b'0' => bits &= !(1 << i),
                _ => {}
            }
        }
        Self::from_bits(bits)
    }

    /// Returns whether `bit` is set in `perms`. `None` grants nothing.
    pub fn check(perms: Option<Self>, bit: Bit) -> bool {
        perms.is_some_and(|p| p.has(bit))
    }

    /// Renders an optional vector, `None` as 32 zeros.
    pub fn render(perms: Option<Self>) -> String {
        perms.map_or_else(|| "0".repeat(BIT_COUNT), |p| p.to_string())
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text: String = (0..BIT_COUNT)
            .map(|i| if self.bits() & (1 << i) != 0 { '1' } else { '0' })
            .collect();
        f.write_str(&text)
    }
}

impl fmt::Debug for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Permissions({self})")
    }
}

impl TryFrom<String> for Permissions {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)?.ok_or(DomainError::InvalidBitPattern { pattern: value })
    }
}

impl From<Permissions> for String {
    fn from(value: Permissions) -> Self {
        value.to_string()
    }
}
