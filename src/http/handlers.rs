use super::AppState;
use crate::health::{self, format_uptime, HealthReport};
use crate::store::Person;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Write;
use tracing::debug;

/// Rows returned by `/crud` when the caller doesn't ask for a page size
const DEFAULT_PAGE_LIMIT: usize = 1;

type Params = Query<HashMap<String, String>>;

#[derive(Debug, Default, Deserialize)]
pub struct PersonForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
}

pub async fn index() -> Html<&'static str> {
    Html("<html><h1>Web Server</h1><a href=\"static/\">HTMX Playground</a></html>\n")
}

/// Uptime while running, 503 otherwise
pub async fn health(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let lifecycle_state = state.lifecycle.state();
    let report = health::report(lifecycle_state, state.started_at, state.clock.now());
    let wants_json = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"));

    match (report, wants_json) {
        (HealthReport::Uptime(uptime), false) => {
            format!("uptime: {}\n", format_uptime(uptime)).into_response()
        }
        (HealthReport::Uptime(uptime), true) => Json(serde_json::json!({
            "status": "ok",
            "uptime": format_uptime(uptime),
            "uptime_seconds": uptime.as_secs(),
        }))
        .into_response(),
        (HealthReport::Unavailable, false) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
        (HealthReport::Unavailable, true) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "unavailable",
                "state": lifecycle_state.to_string(),
            })),
        )
            .into_response(),
    }
}

/// A page of people plus a "Load More" row when the page came back full
pub async fn list_people(State(state): State<AppState>, Query(params): Params) -> Html<String> {
    let offset = params
        .get("offset")
        .and_then(|v| v.parse::<i64>().ok())
        .map_or(0, |offset| offset.max(0) as u64);
    let limit = params
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&limit| limit >= 1)
        .unwrap_or(DEFAULT_PAGE_LIMIT);

    let people = state.store.get_all(offset, limit);
    debug!(target: "service", "Listing {} people after id {}", people.len(), offset);

    let mut body = String::new();
    for person in &people {
        body.push_str(&person_row(person));
    }
    if let Some(last) = people.last().filter(|_| people.len() == limit) {
        body.push_str(&load_more_row(limit, last.id));
    }

    Html(body)
}

pub async fn delete_person(State(state): State<AppState>, Query(params): Params) -> StatusCode {
    let Some(id) = query_id(&params) else {
        return StatusCode::NOT_FOUND;
    };

    if state.store.delete(id).is_none() {
        debug!(target: "service", "Delete of unknown person {}", id);
    }
    StatusCode::OK
}

/// Accepted for the playground's benefit; rows are changed through `/edit`
pub async fn replace_people() -> StatusCode {
    StatusCode::OK
}

pub async fn edit_row(State(state): State<AppState>, Query(params): Params) -> Response {
    match query_id(&params).and_then(|id| state.store.get(id)) {
        Some(person) => Html(editable_row(&person)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn insert_person(State(state): State<AppState>, Form(form): Form<PersonForm>) -> Html<String> {
    let person = state.store.insert(&form.name, &form.location);

    let mut body = String::new();
    let _ = write!(
        body,
        r#"<tr hx-swap-oob="afterbegin:.tablebody" hx-swap="outerHTML">{}</tr> "#,
        person_cells(&person)
    );
    body.push_str(ADD_ROW);
    Html(body)
}

pub async fn update_person(
    State(state): State<AppState>,
    Query(params): Params,
    Form(form): Form<PersonForm>,
) -> Response {
    let updated = query_id(&params).and_then(|id| state.store.update(id, &form.name, &form.location));
    match updated {
        Some(person) => Html(person_row(&person)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn query_id(params: &HashMap<String, String>) -> Option<u64> {
    params.get("id").and_then(|v| v.parse().ok())
}

const ADD_ROW: &str = r#"<tr> <td></td> <td><input name="name" placeholder="name"></td> <td><input name="location" placeholder="location"></td> <td><div class="buttons are-small"><button class="button is-info" hx-post="/edit" hx-include="closest tr" hx-target="closest tr" hx-swap="outerHTML">Add</button></div></td> </tr>"#;

fn person_cells(person: &Person) -> String {
    format!(
        r#"<td>{id}</td> <td>{name}</td> <td>{location}</td> <td><div class="buttons are-small"><button class="button is-info" hx-get="/edit?id={id}">Edit</button><button class="button is-danger" hx-delete="/crud?id={id}">Delete</button></div></td>"#,
        id = person.id,
        name = escape_html(&person.name),
        location = escape_html(&person.location),
    )
}

fn person_row(person: &Person) -> String {
    format!("<tr> {} </tr>", person_cells(person))
}

fn editable_row(person: &Person) -> String {
    format!(
        r#"<tr> <td>{id}</td> <td><input name='name' value='{name}'></td> <td><input name='location' value='{location}'></td> <td><div class="buttons are-small"><button class="button is-info">Cancel</button><button class="button is-danger" hx-put="/edit?id={id}" hx-include="closest tr">Save</button></div></td> </tr>"#,
        id = person.id,
        name = escape_html(&person.name),
        location = escape_html(&person.location),
    )
}

fn load_more_row(limit: usize, last_id: u64) -> String {
    format!(
        r##"<tr id="replaceMe"> <td colspan="4" class="has-text-centered"> <button class="button is-link" hx-get="/crud?limit={}&offset={}" hx-target="#replaceMe" hx-swap="outerHTML" hx-confirm="unset"> Load More... <span class="htmx-indicator is-transparent"> <span class="icon-text"> <span class="icon"> <i class="fas fa-spinner"></i> </span> </span> </span> </button> </td> </tr>"##,
        limit, last_id
    )
}

/// Escape text for use in element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
