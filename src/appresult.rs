use axum::{http::StatusCode, response::{Html, IntoResponse, Redirect, Response}};
use thiserror::Error;

use crate::{include_res, res};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("login required for {return_url}")]
    LoginRequired { return_url: String },

    #[error("doctor profile required")]
    ProfileRequired,

    #[error(transparent)]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            NotFound(_) => StatusCode::NOT_FOUND,
            Forbidden(_) => StatusCode::FORBIDDEN,
            Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Conflict(_) => StatusCode::CONFLICT,
            LoginRequired { .. } | ProfileRequired => StatusCode::SEE_OTHER,
            Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::LoginRequired { return_url } => {
                Redirect::to(&format!("/login/?return_url={return_url}")).into_response()
            }
            AppError::ProfileRequired => Redirect::to("/register/").into_response(),
            AppError::NotFound(what) => (status, res::sorry(what)).into_response(),
            AppError::Internal(err) => {
                tracing::error!("{err:#}\n{}", err.backtrace());
                (status, "internal error").into_response()
            }
            err => (
                status,
                Html(
                    include_res!(str, "/pages/error.html")
                        .replace("{status}", status.as_str())
                        .replace("{message}", &res::escape(&err.to_string())),
                ),
            )
                .into_response(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("record"),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::Conflict(db_err.message().to_owned())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                Self::NotFound("referenced record")
            }
            _ => Self::Internal(anyhow::Error::from(err)),
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self::Internal(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self::Internal(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(anyhow::Error);
apperr_impl!(std::io::Error);
apperr_impl!(tower_sessions::session::Error);
apperr_impl!(axum::extract::multipart::MultipartError);
apperr_impl!(tokio::task::JoinError);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(AppError::NotFound("doctor").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden("not yours").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::validation("bad").status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::from("boom").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn login_required_redirects_with_return_url() {
        let response = AppError::LoginRequired { return_url: "/chat/2/".into() }.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers()["location"],
            "/login/?return_url=/chat/2/"
        );
    }

    #[test]
    fn profile_required_redirects_to_register() {
        let response = AppError::ProfileRequired.into_response();
        assert_eq!(response.headers()["location"], "/register/");
    }

    #[test]
    fn row_not_found_is_not_found() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
    }
}
