use crate::participant::State;
use std::fmt;

/// Failures raised while checking material received from the other participant.
///
/// These are deliberately coarse: a failed proof does not say which of its
/// sub-checks tripped. Any of them means the exchange must be abandoned.
#[non_exhaustive]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A Schnorr zero-knowledge proof did not verify
    ZeroKnowledgeProof,
    /// A combined commitment (`g^x4`, `gA` or `gB`) was equal to one
    DegenerateCommitment,
    /// Both participants are using the same participant id
    ParticipantIdsEqual,
    /// A payload names a different sender than the one seen in round 1
    ParticipantIdMismatch,
    /// The key confirmation tag did not match
    MacTagMismatch,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::ZeroKnowledgeProof => {
                write!(f, "zero-knowledge proof validation failed")
            }
            ValidationError::DegenerateCommitment => {
                write!(f, "commitment must not be equal to one")
            }
            ValidationError::ParticipantIdsEqual => write!(
                f,
                "both participants are using the same participant id"
            ),
            ValidationError::ParticipantIdMismatch => write!(
                f,
                "payload participant id does not match the id received in round 1"
            ),
            ValidationError::MacTagMismatch => write!(
                f,
                "key confirmation failed, the participants may be using different passwords"
            ),
        }
    }
}

/// Errors that can occur while running the protocol
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A constructor argument was empty or otherwise unusable
    InvalidArgument(&'static str),
    /// The supplied `(p, q, g)` do not describe a prime-order group
    InvalidGroup(&'static str),
    /// The password reduces to zero modulo `q`
    InvalidPassword,
    /// An operation was called out of order, or more than once
    IllegalState {
        /// The operation that was attempted
        operation: &'static str,
        /// The state the participant was in at the time
        state: State,
    },
    /// Material received from the other participant failed validation
    Validation(ValidationError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(reason) => write!(f, "invalid argument: {reason}"),
            Error::InvalidGroup(reason) => write!(f, "invalid prime-order group: {reason}"),
            Error::InvalidPassword => write!(f, "password must not be equal to 0 modulo q"),
            Error::IllegalState { operation, state } => {
                write!(f, "{operation} cannot be called in state {state}")
            }
            Error::Validation(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ValidationError> for Error {
    fn from(error: ValidationError) -> Self {
        Error::Validation(error)
    }
}

/// Result type
pub type Result<T> = core::result::Result<T, Error>;
