use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::render::RenderError;
use crate::signup::SignupError;

/// JSON body of every error response.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ErrorResponseBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Malformed form: {0}")]
    MalformedForm(#[from] FormRejection),
    #[error("Failed to load courses: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Failed to render page: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Signup(#[from] SignupError),
}

impl AppError {
    fn as_status_and_msg(&self) -> (StatusCode, String) {
        match self {
            AppError::MalformedForm(_) => (StatusCode::BAD_REQUEST, "Formulário inválido".into()),
            AppError::Catalog(CatalogError::Database(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Error to get courses.".into())
            }
            AppError::Catalog(e) if e.is_timeout() => {
                (StatusCode::GATEWAY_TIMEOUT, "Error to get courses.".into())
            }
            AppError::Catalog(_) => (StatusCode::BAD_GATEWAY, "Error to get courses.".into()),
            AppError::Render(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error to render page.".into(),
            ),
            AppError::Signup(e) => match e {
                SignupError::InvalidEmail => (StatusCode::BAD_REQUEST, "Email inválido".into()),
                SignupError::Captcha(_) => (StatusCode::BAD_REQUEST, "Recaptcha inválido".into()),
                SignupError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error to save subscriber.".into(),
                ),
                SignupError::Render(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error to render page.".into(),
                ),
                SignupError::Welcome(_) => (
                    StatusCode::BAD_GATEWAY,
                    "Error to send welcome email.".into(),
                ),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, msg) = self.as_status_and_msg();
        if code.is_server_error() {
            tracing::error!(status = code.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = code.as_u16(), error = %self, "Request rejected");
        }
        (code, Json(ErrorResponseBody { error: msg })).into_response()
    }
}
