//! Client errors.

use thiserror::Error;

use roster_core::ApplyError;
use roster_types::TypesError;

use crate::BoundaryError;

/// Errors surfaced to callers of the roster client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The SDK could not be reached, timed out, or lost the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// The SDK was reached and rejected the operation.
    #[error("remote error {code}: {message}")]
    Remote {
        /// SDK-defined error code.
        code: i32,
        /// SDK-provided message.
        message: String,
    },

    /// A payload did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The change would violate a roster invariant.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller input failed validation; nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation refers to an entry the local roster does not hold.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<BoundaryError> for ClientError {
    fn from(e: BoundaryError) -> Self {
        match e {
            BoundaryError::Remote { code, message } => ClientError::Remote { code, message },
            other => ClientError::Transport(other.to_string()),
        }
    }
}

impl From<TypesError> for ClientError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InvalidId(_) => ClientError::InvalidArgument(e.to_string()),
            other => ClientError::Decode(other.to_string()),
        }
    }
}

impl From<ApplyError> for ClientError {
    fn from(e: ApplyError) -> Self {
        match e {
            ApplyError::NotFound { .. } => ClientError::NotFound(e.to_string()),
            ApplyError::Conflict(_) | ApplyError::Unrelated { .. } => {
                ClientError::Conflict(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_types::Uid;

    #[test]
    fn remote_failures_keep_code_and_message() {
        let err: ClientError = BoundaryError::Remote {
            code: 42,
            message: "nope".into(),
        }
        .into();
        assert_eq!(
            err,
            ClientError::Remote {
                code: 42,
                message: "nope".into()
            }
        );
    }

    #[test]
    fn other_boundary_failures_are_transport() {
        let err: ClientError = BoundaryError::Timeout.into();
        assert_eq!(err, ClientError::Transport("request timed out".into()));
    }

    #[test]
    fn blank_id_is_invalid_argument() {
        let err: ClientError = Uid::parse(" ").unwrap_err().into();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[test]
    fn bad_json_is_decode_error() {
        let err: ClientError = roster_types::decode_json::<Vec<u8>>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn apply_errors_map_to_taxonomy() {
        let uid = Uid::parse("u1").unwrap();
        let not_found: ClientError = ApplyError::NotFound {
            what: "friend",
            uid: uid.clone(),
        }
        .into();
        assert!(matches!(not_found, ClientError::NotFound(_)));

        let conflict: ClientError = ApplyError::Conflict(uid).into();
        assert!(matches!(conflict, ClientError::Conflict(_)));
    }
}
