use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{DbErr, retry::Contended};
use services::services::error::ServiceError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Unauthorized")]
    Unauthorized,
}

fn database_status(err: &DbErr) -> (StatusCode, &'static str) {
    match err {
        DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
        err if err.is_contention() => (StatusCode::CONFLICT, "ContentionError"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
    }
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Service(err) => match err {
                ServiceError::Database(db_err) => database_status(db_err),
                ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                ServiceError::UnknownMember => (StatusCode::UNAUTHORIZED, "Unauthorized"),
                ServiceError::ProjectNotFound
                | ServiceError::TaskNotFound
                | ServiceError::InviteCodeNotFound => (StatusCode::NOT_FOUND, "NotFound"),
                ServiceError::NotAMember | ServiceError::NotOwner => {
                    (StatusCode::FORBIDDEN, "ForbiddenError")
                }
                ServiceError::TasksNotInProject(_) => (StatusCode::CONFLICT, "TasksNotInProject"),
                ServiceError::AssigneeNotInProject => {
                    (StatusCode::CONFLICT, "AssigneeNotInProject")
                }
                ServiceError::InviteCodeGenerationFailed => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "InviteCodeGenerationFailed")
                }
            },
            ApiError::Database(db_err) => database_status(db_err),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status_and_type();

        let error_message = match &self {
            ApiError::Service(ServiceError::Database(db_err)) | ApiError::Database(db_err)
                if db_err.is_contention() =>
            {
                "The board is busy, please retry".to_string()
            }
            ApiError::Service(err) if !status_code.is_server_error() => err.to_string(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }

        // Offending ids travel in `data` so the client can tell which tasks were stale.
        if let ApiError::Service(ServiceError::TasksNotInProject(ids)) = self {
            let response = ApiResponse::error_with_data(ids, &error_message);
            return (status_code, Json(response)).into_response();
        }

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
