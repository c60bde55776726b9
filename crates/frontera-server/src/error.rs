use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use frontera_coach::CoachError;
use frontera_core::FronteraError;

// ---------------------------------------------------------------------------
// Internal sentinels for explicit statuses
// ---------------------------------------------------------------------------

/// Private sentinel carrying an explicit HTTP 401 through the
/// `anyhow::Error` chain without touching the `FronteraError` enum.
#[derive(Debug)]
struct UnauthorizedError(String);

impl std::fmt::Display for UnauthorizedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UnauthorizedError {}

/// Private sentinel for an explicit HTTP 404.
#[derive(Debug)]
struct NotFoundError(String);

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotFoundError {}

/// Private sentinel for an explicit HTTP 400.
#[derive(Debug)]
struct BadRequestError(String);

impl std::fmt::Display for BadRequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BadRequestError {}

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 401 Unauthorized error.
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(UnauthorizedError(msg.into()).into())
    }

    /// Construct a 404 Not Found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    /// Construct a 400 Bad Request error.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Sentinels first, then the typed domain errors.
        if let Some(u) = self.0.downcast_ref::<UnauthorizedError>() {
            let body = serde_json::json!({ "error": u.0.clone() });
            return (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
        }
        if let Some(n) = self.0.downcast_ref::<NotFoundError>() {
            let body = serde_json::json!({ "error": n.0.clone() });
            return (StatusCode::NOT_FOUND, axum::Json(body)).into_response();
        }
        if let Some(b) = self.0.downcast_ref::<BadRequestError>() {
            let body = serde_json::json!({ "error": b.0.clone() });
            return (StatusCode::BAD_REQUEST, axum::Json(body)).into_response();
        }

        // A coach failure is an upstream failure from the caller's view.
        if self.0.downcast_ref::<CoachError>().is_some() {
            let body = serde_json::json!({ "error": self.0.to_string() });
            return (StatusCode::BAD_GATEWAY, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<FronteraError>() {
            match e {
                FronteraError::ConversationNotFound(_)
                | FronteraError::BetNotFound(_)
                | FronteraError::AssumptionNotFound(_) => StatusCode::NOT_FOUND,
                FronteraError::StaleWrite { .. } => StatusCode::CONFLICT,
                FronteraError::InvalidPhaseTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                FronteraError::InvalidPhase(_)
                | FronteraError::UnknownXpEvent(_)
                | FronteraError::UnknownTerritory(_)
                | FronteraError::UnknownAgentType(_)
                | FronteraError::InvalidStatus(_)
                | FronteraError::MissingAnswer(_)
                | FronteraError::UnknownQuestion(_)
                | FronteraError::InvalidLikertScore { .. }
                | FronteraError::UnknownChoice { .. } => StatusCode::BAD_REQUEST,
                FronteraError::Sqlite(_)
                | FronteraError::Io(_)
                | FronteraError::Yaml(_)
                | FronteraError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn conversation_not_found_maps_to_404() {
        let err = AppError(FronteraError::ConversationNotFound(Uuid::new_v4()).into());
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn stale_write_maps_to_409() {
        let err = AppError(
            FronteraError::StaleWrite {
                conversation: Uuid::new_v4(),
                expected: 3,
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn invalid_transition_maps_to_422() {
        let err = AppError(
            FronteraError::InvalidPhaseTransition {
                phase: "discovery".into(),
                event: "bet_created".into(),
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn unknown_xp_event_maps_to_400() {
        let err = AppError(FronteraError::UnknownXpEvent("made_up".into()).into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn likert_validation_maps_to_400() {
        let err = AppError(
            FronteraError::InvalidLikertScore {
                id: "v1".into(),
                score: 9,
            }
            .into(),
        );
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn coach_failure_maps_to_502() {
        let err = AppError(CoachError::Timeout.into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unauthorized_constructor_maps_to_401() {
        let err = AppError::unauthorized("missing identity headers");
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn not_found_constructor_maps_to_404() {
        let err = AppError::not_found("no assessment on file");
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn other_errors_map_to_500() {
        let err = AppError(anyhow::anyhow!("something unexpected"));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_body_is_json_error_object() {
        let err = AppError(FronteraError::UnknownTerritory("partner".into()).into());
        let response = err.into_response();
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .expect("should have content-type");
        assert!(ct.to_str().unwrap().contains("application/json"));
    }
}
