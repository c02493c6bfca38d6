//! Error types for cabinet parsing and creation.

use std::io;

use thiserror::Error;

/// Result type for cabinet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The ways reading or writing a cabinet can fail.
///
/// Failures fall into two families that callers are expected to tell apart:
/// *corruption* (the data was recognized as a cabinet but violates an
/// internal consistency rule) and *not supported* (the data uses a feature
/// this crate deliberately does not implement, such as chained cabinet sets
/// or Quantum/LZX compression). Use [`Error::is_corruption`] and
/// [`Error::is_not_supported`] to classify; corruption may be worth a repair
/// attempt by the caller, not-supported never is.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error from the underlying buffer plumbing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The buffer is not a cabinet file (too short or bad magic).
    #[error("data is not application/vnd.ms-cab-compressed")]
    NotCabinet,

    /// The cabinet declares a format version other than 1.3.
    #[error("version {0}.{1} cabinet files are not supported")]
    UnsupportedVersion(u8, u8),

    /// The cabinet is part of a chained (multi-cabinet) set.
    #[error("chained cabinet sets are not supported")]
    ChainedCabinet,

    /// A folder uses Quantum compression.
    #[error("Quantum compression is not supported")]
    QuantumUnsupported,

    /// A folder uses LZX compression.
    #[error("LZX compression is not supported")]
    LzxUnsupported,

    /// A folder uses a compression type this crate does not recognize.
    #[error("compression type {0:#06x} is not supported")]
    UnsupportedCompression(u16),

    /// The cabinet was recognized but violates a consistency rule.
    #[error("cabinet corrupt: {0}")]
    Corrupt(String),

    /// An internal invariant was violated; this indicates a defect in the
    /// codec (or the tool that produced the cabinet), not ordinary bad input.
    #[error("internal codec error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns true if the input was recognized as a cabinet but is
    /// malformed or inconsistent.
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corrupt(_))
    }

    /// Returns true if the input uses a recognized but unimplemented
    /// feature.
    pub fn is_not_supported(&self) -> bool {
        matches!(
            self,
            Error::NotCabinet
                | Error::UnsupportedVersion(_, _)
                | Error::ChainedCabinet
                | Error::QuantumUnsupported
                | Error::LzxUnsupported
                | Error::UnsupportedCompression(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn error_families() {
        assert!(Error::NotCabinet.is_not_supported());
        assert!(Error::UnsupportedVersion(2, 0).is_not_supported());
        assert!(Error::QuantumUnsupported.is_not_supported());
        assert!(!Error::NotCabinet.is_corruption());

        let corrupt = Error::Corrupt("size mismatch".to_string());
        assert!(corrupt.is_corruption());
        assert!(!corrupt.is_not_supported());

        let internal = Error::Internal("length mismatch".to_string());
        assert!(!internal.is_corruption());
        assert!(!internal.is_not_supported());
    }
}
