//! Error types for transaction decoding and construction

use thiserror::Error;

/// A malformed transaction record.
///
/// Format errors are fatal to the single record being decoded and abort
/// its processing; they never surface as a silently-accepted transaction.
/// Verification outcomes are not errors — see
/// [`VerifyFlags`](crate::verifier::VerifyFlags).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("unexpected end of input at byte {0}")]
    UnexpectedEof(usize),

    #[error("{0} trailing bytes after transaction")]
    TrailingData(usize),

    #[error("unknown transaction type {0:#04x}")]
    UnknownTransactionType(u8),

    #[error("duplicate input ({prev_hash}, {prev_index})")]
    DuplicateInput { prev_hash: String, prev_index: u16 },

    #[error("output {0} has zero value")]
    ZeroValueOutput(usize),

    #[error("too many inputs: {0}")]
    TooManyInputs(u64),

    #[error("too many outputs: {0}")]
    TooManyOutputs(u64),

    #[error("too many witness scripts: {0}")]
    TooManyWitnesses(u64),

    #[error("witness script of {0} bytes exceeds limit")]
    OversizedWitness(u64),
}

pub type Result<T> = std::result::Result<T, FormatError>;
