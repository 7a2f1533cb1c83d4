use axum::{debug_handler, extract::State, http::StatusCode, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{include_res, res, AppError, AppResult, AppState};

use super::{sign_in, store};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 150;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SignupForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password1: String,
    #[serde(default)]
    password2: String,
}

impl SignupForm {
    fn validate(&self) -> AppResult<&str> {
        let username = self.username.trim();
        if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
            return Err(AppError::validation("username must be between 1 and 150 characters"));
        }
        if !username.chars().all(|c| c.is_alphanumeric() || "@.+-_".contains(c)) {
            return Err(AppError::validation("username may only contain letters, digits and @/./+/-/_"));
        }
        if self.password1 != self.password2 {
            return Err(AppError::validation("the two password fields didn't match"));
        }
        if self.password1.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation("password must be at least 8 characters"));
        }
        Ok(username)
    }
}

fn signup_html(username: &str, error: Option<&str>) -> Html<String> {
    Html(
        include_res!(str, "/pages/signup.html")
            .replace("{error}", &res::error_banner(error))
            .replace("{username}", &res::escape(username)),
    )
}

#[debug_handler]
pub(crate) async fn signup_page() -> impl IntoResponse {
    signup_html("", None)
}

#[debug_handler(state = AppState)]
pub(crate) async fn signup(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(form): Form<SignupForm>,
) -> AppResult<Response> {
    let created = match form.validate() {
        Ok(username) => store::create_account(&db_pool, username, &form.password1).await,
        Err(err) => Err(err),
    };

    let account_id = match created {
        Ok(id) => id,
        Err(AppError::Validation(msg) | AppError::Conflict(msg)) => {
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, signup_html(&form.username, Some(&msg))).into_response());
        }
        Err(err) => return Err(err),
    };

    sign_in(&session, account_id).await?;
    tracing::info!(account_id, username = form.username.trim(), "account created");

    Ok(Redirect::to("/register/").into_response())
}
