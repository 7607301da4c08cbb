use std::fmt;

use crate::model::hash::{HashFamily, HashParseError};

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DimensionMismatch,
    LengthMismatch,
    HashWidthMismatch,
    InvalidHash,
    InvalidThreshold,
    InvalidTopK,
    InvalidDimension,
    InvalidHashSize,
    ConfigParseError,
    InputParseError,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DimensionMismatch => "E1001",
            Self::LengthMismatch => "E1002",
            Self::HashWidthMismatch => "E1003",
            Self::InvalidHash => "E2001",
            Self::InvalidThreshold => "E2002",
            Self::InvalidTopK => "E2003",
            Self::InvalidDimension => "E3001",
            Self::InvalidHashSize => "E3002",
            Self::ConfigParseError => "E3003",
            Self::InputParseError => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::DimensionMismatch => "Embedding dimension mismatch",
            Self::LengthMismatch => "Parallel input length mismatch",
            Self::HashWidthMismatch => "Perceptual hash width mismatch",
            Self::InvalidHash => "Invalid perceptual hash",
            Self::InvalidThreshold => "Threshold out of range",
            Self::InvalidTopK => "Invalid top_k",
            Self::InvalidDimension => "Invalid embedding dimension",
            Self::InvalidHashSize => "Invalid hash size",
            Self::ConfigParseError => "Config file parse error",
            Self::InputParseError => "Input document parse error",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::DimensionMismatch => {
                Some("Re-embed all vectors with the same model as the configured dimension.")
            }
            Self::LengthMismatch => Some("Supply exactly one id per candidate embedding."),
            Self::HashWidthMismatch => {
                Some("Recompute hashes with a single hash_size before comparing.")
            }
            Self::InvalidHash => Some("Hashes must be non-empty hexadecimal strings."),
            Self::InvalidThreshold => Some(
                "Similarity thresholds lie in [0, 1]; hash thresholds are non-negative weighted scores.",
            ),
            Self::InvalidTopK => Some("Omit top_k or pass a value of at least 1."),
            Self::InvalidDimension => Some("Set semantic.dimension to a positive value."),
            Self::InvalidHashSize => Some("Set visual.hash_size between 1 and 31."),
            Self::ConfigParseError => Some("Fix syntax in .nearmatch/config.toml and retry."),
            Self::InputParseError => Some("Check the JSON input against `nearmatch <cmd> --help`."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Contract violations raised by the similarity and fusion engines.
///
/// Degenerate-but-valid input (empty candidate lists, empty hash sets, zero
/// vectors) never produces one of these.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("candidate/id length mismatch: {candidates} candidates, {ids} ids")]
    LengthMismatch { candidates: usize, ids: usize },

    #[error("hash width mismatch: {left_bits} bits vs {right_bits} bits")]
    HashWidthMismatch { left_bits: usize, right_bits: usize },

    #[error("{family} hash width mismatch: {left_bits} bits vs {right_bits} bits")]
    FamilyWidthMismatch {
        family: HashFamily,
        left_bits: usize,
        right_bits: usize,
    },

    #[error("hash of {bits} bits exceeds the configured {max_bits}-bit hash size")]
    HashTooWide { bits: usize, max_bits: usize },

    #[error(transparent)]
    InvalidHash(#[from] HashParseError),

    #[error("threshold {value} outside {expected}")]
    InvalidThreshold { value: f64, expected: &'static str },

    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("embedding dimension must be positive")]
    InvalidDimension,

    #[error("hash_size {0} outside supported range 1..=31")]
    InvalidHashSize(u32),
}

impl MatchError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::LengthMismatch { .. } => ErrorCode::LengthMismatch,
            Self::HashWidthMismatch { .. }
            | Self::FamilyWidthMismatch { .. }
            | Self::HashTooWide { .. } => ErrorCode::HashWidthMismatch,
            Self::InvalidHash(_) => ErrorCode::InvalidHash,
            Self::InvalidThreshold { .. } => ErrorCode::InvalidThreshold,
            Self::InvalidTopK => ErrorCode::InvalidTopK,
            Self::InvalidDimension => ErrorCode::InvalidDimension,
            Self::InvalidHashSize(_) => ErrorCode::InvalidHashSize,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, MatchError};
    use crate::model::hash::HashFamily;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 11] = [
        ErrorCode::DimensionMismatch,
        ErrorCode::LengthMismatch,
        ErrorCode::HashWidthMismatch,
        ErrorCode::InvalidHash,
        ErrorCode::InvalidThreshold,
        ErrorCode::InvalidTopK,
        ErrorCode::InvalidDimension,
        ErrorCode::InvalidHashSize,
        ErrorCode::ConfigParseError,
        ErrorCode::InputParseError,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::HashWidthMismatch.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn width_mismatch_variants_share_a_code() {
        let plain = MatchError::HashWidthMismatch {
            left_bits: 64,
            right_bits: 256,
        };
        let family = MatchError::FamilyWidthMismatch {
            family: HashFamily::Dhash,
            left_bits: 64,
            right_bits: 256,
        };
        assert_eq!(plain.code(), family.code());
        assert_eq!(
            family.to_string(),
            "dhash hash width mismatch: 64 bits vs 256 bits"
        );
    }

    #[test]
    fn oversized_hash_reports_width_code() {
        let err = MatchError::HashTooWide {
            bits: 2048,
            max_bits: 64,
        };
        assert_eq!(err.code(), ErrorCode::HashWidthMismatch);
        assert_eq!(
            err.to_string(),
            "hash of 2048 bits exceeds the configured 64-bit hash size"
        );
    }

    #[test]
    fn hints_follow_codes() {
        let err = MatchError::InvalidTopK;
        assert_eq!(err.hint(), ErrorCode::InvalidTopK.hint());
        assert!(err.hint().is_some());
    }
}
