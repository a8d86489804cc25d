use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use finance_repo::transaction_repo::TransactionRepoError;
use finance_repo::user_repo::UserRepoError;
use thiserror::Error;
use tracing::error;

use crate::quote::LookupError;

#[derive(Error, Debug)]
pub enum HandlerError {
    /// Invalid input or a failed business rule, shown to the user as is.
    #[error("{0}")]
    Apology(String),
    #[error("Unable to get a quote for {0}")]
    QuoteUnavailable(String),
    /// The server is misconfigured; the message is logged but never shown.
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    UserRepo(#[from] UserRepoError),
    #[error(transparent)]
    TransactionRepo(#[from] TransactionRepoError),
    #[error(transparent)]
    Password(#[from] argon2::Error),
    #[error(transparent)]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl HandlerError {
    pub fn apology(message: impl Into<String>) -> HandlerError {
        HandlerError::Apology(message.into())
    }
}

impl ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::Apology(_) => StatusCode::FORBIDDEN,
            HandlerError::QuoteUnavailable(_) | HandlerError::Lookup(_) => StatusCode::BAD_GATEWAY,
            HandlerError::UserRepo(UserRepoError::UserNotFound(_)) => StatusCode::NOT_FOUND,
            HandlerError::UserRepo(UserRepoError::UserAlreadyExists(_)) => StatusCode::CONFLICT,
            HandlerError::TransactionRepo(TransactionRepoError::UserNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            HandlerError::TransactionRepo(
                TransactionRepoError::InvalidShares(_)
                | TransactionRepoError::InsufficientFunds { .. }
                | TransactionRepoError::InsufficientShares { .. },
            ) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!(err = %self, "request failed");
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_owned()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(serde_json::json!({ "apology": message }))
    }
}
