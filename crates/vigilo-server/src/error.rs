use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use vigilo::{SearchError, error::VigiloError};
use vigilo_data_processing::DataError;

use crate::payload::ErrorResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Search failed: {0}")]
    Search(#[from] VigiloError),

    #[error("Misconfigured environment: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SearchError> for AppError {
    fn from(e: SearchError) -> Self {
        Self::Search(e.into())
    }
}

impl From<DataError> for AppError {
    fn from(e: DataError) -> Self {
        Self::Search(e.into())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::Search(VigiloError::SearchError(SearchError::InvalidArgument(_))) => {
                StatusCode::BAD_REQUEST
            }
            Self::Search(_) | Self::Config(_) | Self::InternalError(_) | Self::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::BadRequest(message)
            | Self::Search(VigiloError::SearchError(SearchError::InvalidArgument(message))) => {
                message.clone()
            }
            other => {
                error!(error = %other, "Request failed");
                "Search failed, please try again later".to_string()
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
