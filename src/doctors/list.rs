use axum::{debug_handler, extract::{Query, State}, response::Html};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{auth, chat, connections, include_res, res, AppResult, AppState};

use super::{doctor_item_html, store, Doctor};

#[derive(Debug, Deserialize)]
pub(crate) struct SearchQuery {
    search: Option<String>,
}

#[debug_handler(state = AppState)]
pub(crate) async fn home(
    Query(SearchQuery { search }): Query<SearchQuery>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Html<String>> {
    let doctors = store::list(&db_pool, search.as_deref()).await?;
    let doctor_items: String = doctors.iter().map(doctor_item_html).collect();

    let sidebar = match auth::current_doctor(&db_pool, &session).await? {
        Some(me) => sidebar_html(&db_pool, &me).await?,
        None => String::new(),
    };

    Ok(Html(
        include_res!(str, "/pages/home.html")
            .replace("{nav}", include_res!(str, "/pages/nav.html"))
            .replace("{sidebar}", &sidebar)
            .replace("{search}", &res::escape(search.as_deref().unwrap_or_default()))
            .replace("{doctor_items}", &doctor_items),
    ))
}

async fn sidebar_html(db_pool: &SqlitePool, me: &Doctor) -> AppResult<String> {
    let connected_items: String = connections::store::connected_with(db_pool, me.id)
        .await?
        .iter()
        .map(|peer| format!(
            r#"<li><a href="/doctor/{id}/">{name}</a> <a href="/chat/{id}/">chat</a></li>"#,
            id = peer.doctor_id,
            name = res::escape(&peer.name),
        ))
        .collect();

    let incoming = connections::store::find_pending_for_doctor(db_pool, me.id).await?;
    let outgoing = connections::store::find_pending_from_doctor(db_pool, me.id).await?;
    let pending_items: String = incoming
        .iter()
        .map(|peer| format!(
            r#"<li><a href="/doctor/{id}/">{name}</a> wants to connect <a href="/accept/{conn}/">accept</a></li>"#,
            id = peer.doctor_id,
            name = res::escape(&peer.name),
            conn = peer.connection_id,
        ))
        .chain(outgoing.iter().map(|peer| format!(
            r#"<li>waiting on <a href="/doctor/{id}/">{name}</a></li>"#,
            id = peer.doctor_id,
            name = res::escape(&peer.name),
        )))
        .collect();

    let unread_items: String = chat::store::unread_for(db_pool, me.id)
        .await?
        .iter()
        .map(|msg| format!(
            r#"<li><a href="/chat/{id}/">{name}</a>: {excerpt}</li>"#,
            id = msg.sender_id,
            name = res::escape(&msg.sender_name),
            excerpt = res::escape(&msg.text.chars().take(60).collect::<String>()),
        ))
        .collect();

    Ok(include_res!(str, "/pages/sidebar.html")
        .replace("{connected_items}", &connected_items)
        .replace("{pending_items}", &pending_items)
        .replace("{unread_items}", &unread_items))
}
