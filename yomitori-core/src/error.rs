use crate::section::SectionType;
use thiserror::Error;

/// Errors raised while reading an ELF image.
#[derive(Debug, Error)]
pub enum ElfError {
    /// The input violates a structural invariant of the container format
    /// (bad magic, unsupported version, bad class or data order,
    /// out-of-range section name table index, unterminated string).
    #[error("invalid ELF: {0}")]
    Format(String),

    /// A requested offset lies outside the byte range being indexed.
    #[error("offset {offset:#x} out of range for {size} byte region")]
    Range { offset: u64, size: u64 },

    /// A section was used through an accessor that requires a different
    /// declared type.
    #[error("cannot use {found:?} section as {expected:?}")]
    TypeMismatch {
        expected: SectionType,
        found: SectionType,
    },

    /// An I/O failure from the underlying source, including a header
    /// region shorter than the layout it claims to carry.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ElfError {
    pub(crate) fn format(msg: impl Into<String>) -> ElfError {
        ElfError::Format(msg.into())
    }
}

pub type Result<T, E = ElfError> = std::result::Result<T, E>;
