pub mod control;
pub mod lattice;
pub mod sessions;
pub mod system;

pub use control::control_handler;
pub use lattice::lattice_handler;
pub use sessions::{get_session, start_session, step_session, stop_session};
pub use system::{cosmic_handler, health_handler};

use axum::http::StatusCode;

use crate::error::HivemindError;

/// Map engine errors onto HTTP status codes. Everything that is not a caller
/// mistake is a 500 with the error text as the body.
pub fn error_response(err: HivemindError) -> (StatusCode, String) {
    let status = match &err {
        HivemindError::Auth(_) => StatusCode::UNAUTHORIZED,
        HivemindError::Validation(_) => StatusCode::BAD_REQUEST,
        HivemindError::SessionNotFound(_) | HivemindError::HiveNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        HivemindError::State(_) | HivemindError::StepConflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (HivemindError::Auth("no".into()), StatusCode::UNAUTHORIZED),
            (
                HivemindError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                HivemindError::SessionNotFound(Uuid::nil()),
                StatusCode::NOT_FOUND,
            ),
            (
                HivemindError::HiveNotFound(Uuid::nil()),
                StatusCode::NOT_FOUND,
            ),
            (HivemindError::State("stopped".into()), StatusCode::CONFLICT),
            (
                HivemindError::StepConflict(Uuid::nil()),
                StatusCode::CONFLICT,
            ),
            (
                HivemindError::Queue("down".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert!(err.is_client_error() == (expected != StatusCode::INTERNAL_SERVER_ERROR));
            assert_eq!(error_response(err).0, expected);
        }
    }
}
