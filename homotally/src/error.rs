use thiserror::Error;
use uuid::Uuid;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("homotally: invalid argument: {0}")]
    InvalidArgument(String),

    #[error("homotally: secure random source unavailable: {0}")]
    InsufficientEntropy(#[source] rand::Error),

    #[error("homotally: invalid vote: {0}")]
    InvalidVote(String),

    #[error("homotally: value has no modular inverse")]
    NotInvertible,

    #[error("homotally: range overflow: {0}")]
    RangeOverflow(String),

    #[error("homotally: decryption key does not match the election public key")]
    MismatchedKeys,

    #[error("homotally: voter {0} is not eligible")]
    NotEligible(String),

    #[error("homotally: voter {0} has already voted")]
    AlreadyVoted(String),

    #[error("homotally: election is closed")]
    ElectionClosed,

    #[error("homotally: malformed ballot {0}")]
    MalformedBallot(Uuid),

    #[error("homotally: secret recovery failed")]
    SecretRecoveryFailed,

    #[error("homotally: ballot store lock poisoned")]
    StorePoisoned,

    #[error("homotally: CBOR error: {0}")]
    CBORDeserialization(#[from] serde_cbor::Error),

    #[error("homotally: JSON error: {0}")]
    JSONDeserialization(#[from] serde_json::Error),

    #[error("homotally: error deserializing ballots: unknown format")]
    DeserializationUnknownFormat,
}

impl Error {
    /// Errors that indicate a broken parameter set or scheme rather than a bad request.
    ///
    /// These must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::NotInvertible | Error::MismatchedKeys | Error::RangeOverflow(_)
        )
    }
}
