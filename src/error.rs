use thiserror::Error;
use uuid::Uuid;

/// Crypto-layer error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("urna: malformed key material: {0}")]
    KeyFormat(String),

    #[error("urna: PEM encoding error: {0}")]
    Pem(String),

    #[error("urna: RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("urna: signature error: {0}")]
    Signature(#[from] rsa::signature::Error),

    #[error("urna: ballot content cannot be canonically encoded: {0}")]
    Encoding(String),

    #[error("urna: ciphertext failed authentication")]
    Tampered,

    #[error("urna: JSON error deserializing ballot: {0}")]
    JSONDeserialization(#[from] serde_json::Error),

    #[error("urna: CBOR error deserializing ballot: {0}")]
    CBORDeserialization(#[from] serde_cbor::Error),
}

/// Key lifecycle and vote casting errors
///
/// Each variant maps to exactly one user-visible outcome at the request
/// boundary. `Crypto` carries server-side faults (for example corrupted
/// stored key material) that are not the voter's doing.
#[derive(Debug, Error)]
pub enum VoteError {
    #[error("urna vote: voter {0} not found")]
    VoterNotFound(Uuid),

    #[error("urna vote: identifier already registered")]
    DuplicateIdentifier,

    #[error("urna vote: no public key registered for this voter")]
    NoKeyRegistered,

    #[error("urna vote: supplied key material is not parseable")]
    KeyFormat,

    #[error("urna vote: supplied private key does not match the registered public key")]
    KeyMismatch,

    #[error("urna vote: a ballot has already been cast for this voter")]
    AlreadyVoted,

    #[error("urna vote: ballot content cannot be canonically encoded")]
    Encoding,

    #[error("urna vote: {0}")]
    Crypto(#[from] Error),
}
