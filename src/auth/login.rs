use axum::{debug_handler, extract::{Query, State}, http::StatusCode, response::{Html, IntoResponse, Redirect, Response}, Form};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{include_res, res, AppResult, AppState};

use super::{local_return_url, sign_in, store};

#[derive(Deserialize)]
pub(crate) struct LoginQuery {
    pub(crate) return_url: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    return_url: Option<String>,
}

fn login_html(return_url: &str, error: Option<&str>) -> Html<String> {
    Html(
        include_res!(str, "/pages/login.html")
            .replace("{error}", &res::error_banner(error))
            .replace("{return_url}", &res::escape(return_url)),
    )
}

#[debug_handler]
pub(crate) async fn login_page(
    Query(LoginQuery { return_url }): Query<LoginQuery>,
) -> impl IntoResponse {
    login_html(&local_return_url(return_url), None)
}

#[debug_handler(state = AppState)]
pub(crate) async fn login(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(LoginForm { username, password, return_url }): Form<LoginForm>,
) -> AppResult<Response> {
    let return_url = local_return_url(return_url);

    let Some(account_id) = store::authenticate(&db_pool, username.trim(), &password).await? else {
        tracing::info!(username = username.trim(), "failed login");
        return Ok((
            StatusCode::UNAUTHORIZED,
            login_html(&return_url, Some("Invalid username or password")),
        ).into_response());
    };

    sign_in(&session, account_id).await?;
    tracing::info!(account_id, "welcome back");

    Ok(Redirect::to(&return_url).into_response())
}
