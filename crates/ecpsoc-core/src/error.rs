//! Assembly-time error taxonomy.
//!
//! Every error aborts the assembly pass; there is no partial success.

use std::fmt;

/// Coarse classification of a [`SocError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unrepresentable clock request or incompatible cache/timing mode.
    Configuration,
    /// Address region size or base conflict.
    Overflow,
    /// A dependency was not ready when an operation needed it.
    Sequencing,
    /// Peripheral-specific binding failure.
    Attach,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Overflow => "overflow",
            ErrorKind::Sequencing => "sequencing",
            ErrorKind::Attach => "attach",
        };
        f.write_str(name)
    }
}

/// Errors raised while composing a target.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SocError {
    /// Requested clock ratio/phase is unrepresentable, or cache and timing
    /// mode are incompatible.
    #[error("configuration error: {detail}")]
    Configuration {
        /// Description of the rejected configuration.
        detail: String,
    },

    /// A region cannot hold the requested footprint.
    #[error(
        "region '{region}' overflow: requested 0x{requested:X} bytes, 0x{available:X} available"
    )]
    Overflow {
        /// Region name.
        region: String,
        /// Requested size in bytes.
        requested: u64,
        /// Available size in bytes.
        available: u64,
    },

    /// Two regions claim the same addresses.
    #[error("region '{region}' (0x{base:08X}..0x{end:08X}) overlaps region '{other}'")]
    Overlap {
        /// Region being declared.
        region: String,
        /// Its base address.
        base: u64,
        /// Its end address (exclusive).
        end: u64,
        /// The region already occupying part of that range.
        other: String,
    },

    /// An operation ran before the stage it depends on.
    #[error("sequencing error: {operation} requires {dependency}")]
    Sequencing {
        /// The operation that was attempted.
        operation: String,
        /// What had to be ready first.
        dependency: String,
    },

    /// A peripheral could not be bound.
    #[error("cannot attach {peripheral}: {detail}")]
    Attach {
        /// Peripheral name.
        peripheral: String,
        /// Why the binding failed.
        detail: String,
    },
}

impl SocError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SocError::Configuration { .. } => ErrorKind::Configuration,
            SocError::Overflow { .. } | SocError::Overlap { .. } => ErrorKind::Overflow,
            SocError::Sequencing { .. } => ErrorKind::Sequencing,
            SocError::Attach { .. } => ErrorKind::Attach,
        }
    }

    pub fn configuration(detail: impl Into<String>) -> Self {
        SocError::Configuration {
            detail: detail.into(),
        }
    }

    pub fn sequencing(operation: impl Into<String>, dependency: impl Into<String>) -> Self {
        SocError::Sequencing {
            operation: operation.into(),
            dependency: dependency.into(),
        }
    }

    pub fn attach(peripheral: impl Into<String>, detail: impl Into<String>) -> Self {
        SocError::Attach {
            peripheral: peripheral.into(),
            detail: detail.into(),
        }
    }
}

/// Result type for assembly operations.
pub type Result<T> = std::result::Result<T, SocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_an_overflow() {
        let err = SocError::Overlap {
            region: "sram".into(),
            base: 0x1000,
            end: 0x2000,
            other: "rom".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Overflow);
        assert!(err.to_string().contains("'rom'"));
    }

    #[test]
    fn overflow_message_reports_sizes() {
        let err = SocError::Overflow {
            region: "main_ram".into(),
            requested: 0x80_0000,
            available: 0x40_0000,
        };
        let msg = err.to_string();
        assert!(msg.contains("main_ram"));
        assert!(msg.contains("0x800000"));
        assert!(msg.contains("0x400000"));
    }

    #[test]
    fn helper_constructors() {
        assert_eq!(
            SocError::sequencing("attach dram", "clock tree").kind(),
            ErrorKind::Sequencing
        );
        assert_eq!(SocError::attach("ethernet", "no pads").kind(), ErrorKind::Attach);
        assert_eq!(
            SocError::configuration("bad phase").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(ErrorKind::Overflow.to_string(), "overflow");
    }
}
