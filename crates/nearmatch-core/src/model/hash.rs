//! Perceptual hash values and per-image hash sets.
//!
//! A [`PerceptualHash`] is a fixed-width bit string exchanged as hexadecimal
//! text. Its width is four bits per hex digit, so a `hash_size = 8` hash
//! (64 bits) travels as 16 digits and a `hash_size = 16` hash (256 bits) as
//! 64 digits. Hashes of different widths are never comparable.
//!
//! A [`PerceptualHashSet`] holds at most one hash per [`HashFamily`]. Absent
//! families are explicit `None` fields rather than missing map keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors produced while decoding hash text at the input boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HashParseError {
    #[error("perceptual hash is empty")]
    Empty,

    #[error("perceptual hash {input:?} is not valid hex: {source}")]
    InvalidHex {
        input: String,
        #[source]
        source: hex::FromHexError,
    },

    #[error("unknown hash family {0:?}; expected one of phash, ahash, dhash, whash")]
    UnknownFamily(String),
}

// ---------------------------------------------------------------------------
// HashFamily
// ---------------------------------------------------------------------------

/// The perceptual hash algorithms an image hasher may produce.
///
/// Variant order is the canonical comparison order and also the key order of
/// every distance map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashFamily {
    /// DCT-based perceptual hash; the most robust family.
    Phash,
    /// Average hash.
    Ahash,
    /// Difference (gradient) hash.
    Dhash,
    /// Wavelet hash.
    Whash,
}

impl HashFamily {
    pub const ALL: [Self; 4] = [Self::Phash, Self::Ahash, Self::Dhash, Self::Whash];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phash => "phash",
            Self::Ahash => "ahash",
            Self::Dhash => "dhash",
            Self::Whash => "whash",
        }
    }
}

impl fmt::Display for HashFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashFamily {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phash" => Ok(Self::Phash),
            "ahash" => Ok(Self::Ahash),
            "dhash" => Ok(Self::Dhash),
            "whash" => Ok(Self::Whash),
            _ => Err(HashParseError::UnknownFamily(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// PerceptualHash
// ---------------------------------------------------------------------------

/// A decoded perceptual hash.
///
/// Odd digit counts are accepted: the value is decoded as if a leading `0`
/// nibble were present, and the width stays `4 * digits`. Two hashes of the
/// same width are padded identically, so Hamming distances are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PerceptualHash {
    bytes: Vec<u8>,
    digits: usize,
}

impl PerceptualHash {
    /// Decode a hash from hexadecimal text (surrounding whitespace ignored).
    ///
    /// # Errors
    ///
    /// Returns [`HashParseError::Empty`] for blank input and
    /// [`HashParseError::InvalidHex`] for anything that is not hex.
    pub fn from_hex(text: &str) -> Result<Self, HashParseError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(HashParseError::Empty);
        }

        let digits = trimmed.len();
        let decoded = if digits % 2 == 1 {
            hex::decode(format!("0{trimmed}"))
        } else {
            hex::decode(trimmed)
        };
        let bytes = decoded.map_err(|source| HashParseError::InvalidHex {
            input: trimmed.to_string(),
            source,
        })?;

        Ok(Self { bytes, digits })
    }

    /// Wrap raw hash bytes produced by an image hasher.
    ///
    /// # Errors
    ///
    /// Returns [`HashParseError::Empty`] when `bytes` is empty.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, HashParseError> {
        if bytes.is_empty() {
            return Err(HashParseError::Empty);
        }
        let digits = bytes.len() * 2;
        Ok(Self { bytes, digits })
    }

    /// Width of the hash in bits.
    #[must_use]
    pub const fn bits(&self) -> usize {
        self.digits * 4
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Render back to the hex text this hash was parsed from (lowercased).
    #[must_use]
    pub fn to_hex(&self) -> String {
        let full = hex::encode(&self.bytes);
        if self.digits % 2 == 1 {
            full[1..].to_string()
        } else {
            full
        }
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for PerceptualHash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for PerceptualHash {
    type Error = HashParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<PerceptualHash> for String {
    fn from(value: PerceptualHash) -> Self {
        value.to_hex()
    }
}

// ---------------------------------------------------------------------------
// PerceptualHashSet
// ---------------------------------------------------------------------------

/// All hashes computed for one image, plus descriptive metadata.
///
/// `width`, `height` and `format` travel with the hashes but never take part
/// in comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptualHashSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phash: Option<PerceptualHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ahash: Option<PerceptualHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhash: Option<PerceptualHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whash: Option<PerceptualHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl PerceptualHashSet {
    #[must_use]
    pub const fn get(&self, family: HashFamily) -> Option<&PerceptualHash> {
        match family {
            HashFamily::Phash => self.phash.as_ref(),
            HashFamily::Ahash => self.ahash.as_ref(),
            HashFamily::Dhash => self.dhash.as_ref(),
            HashFamily::Whash => self.whash.as_ref(),
        }
    }

    /// Store `hash` for `family`, returning the hash it replaced.
    pub fn insert(&mut self, family: HashFamily, hash: PerceptualHash) -> Option<PerceptualHash> {
        let slot = match family {
            HashFamily::Phash => &mut self.phash,
            HashFamily::Ahash => &mut self.ahash,
            HashFamily::Dhash => &mut self.dhash,
            HashFamily::Whash => &mut self.whash,
        };
        slot.replace(hash)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, family: HashFamily, hash: PerceptualHash) -> Self {
        self.insert(family, hash);
        self
    }

    /// Parse `hex` and store it for `family`.
    ///
    /// # Errors
    ///
    /// Propagates [`PerceptualHash::from_hex`] failures.
    pub fn with_hex(self, family: HashFamily, hex: &str) -> Result<Self, HashParseError> {
        Ok(self.with(family, PerceptualHash::from_hex(hex)?))
    }

    /// `true` when no family carries a hash. Metadata is ignored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.phash.is_none() && self.ahash.is_none() && self.dhash.is_none() && self.whash.is_none()
    }

    /// Families carrying a hash, in canonical order.
    pub fn families(&self) -> impl Iterator<Item = HashFamily> + '_ {
        HashFamily::ALL
            .into_iter()
            .filter(|family| self.get(*family).is_some())
    }
}
