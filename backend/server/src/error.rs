use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pantry::{IdentityError, PantryError, StoreError};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error(transparent)]
    Pantry(#[from] PantryError),
}

impl From<JsonRejection> for AppError {
    fn from(_: JsonRejection) -> Self {
        AppError::MalformedPayload
    }
}

impl From<QueryRejection> for AppError {
    fn from(_: QueryRejection) -> Self {
        AppError::MalformedPayload
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::Pantry(error) => match error {
                PantryError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
                PantryError::EmptyInput(_) => StatusCode::BAD_REQUEST,
                PantryError::NotFound(_) => StatusCode::NOT_FOUND,
                PantryError::QuantityLimit(_) => StatusCode::UNPROCESSABLE_ENTITY,
                PantryError::Identity(error) => match error {
                    IdentityError::MissingFields
                    | IdentityError::InvalidEmail
                    | IdentityError::WeakPassword(_)
                    | IdentityError::MissingCredentials => StatusCode::BAD_REQUEST,
                    IdentityError::EmailInUse => StatusCode::CONFLICT,
                    IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                    IdentityError::RequiresRecentLogin => StatusCode::FORBIDDEN,
                    IdentityError::Store(error) => store_status(error),
                },
                PantryError::Store(error) => store_status(error),
            },
        }
    }
}

fn store_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Corrupt { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!("{self}");
        }

        (status, self.to_string()).into_response()
    }
}
