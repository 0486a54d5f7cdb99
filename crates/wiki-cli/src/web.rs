//! HTTP front controller.
//!
//! 各ルートはバスへのリクエスト 1 件に対応する。DB には直接触らない。

use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use wiki_core::domain::{AllPages, CreatePage, DeletePage, GetPage, SavePage};
use wiki_core::{BusClient, ErrorCode, ReplyFailure};

pub const NEW_PAGE_MARKDOWN: &str = "# A new page\n\nFeel-free to write in Markdown!\n";

#[derive(Clone)]
pub struct WebState {
    pub client: BusClient,
}

pub fn router(client: BusClient) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/wiki/:page", get(render_page))
        .route("/save", post(save_page))
        .route("/create", post(create_page))
        .route("/delete", post(delete_page))
        .layer(TraceLayer::new_for_http())
        .with_state(WebState { client })
}

// ========================================
// Errors
// ========================================

#[derive(Debug)]
pub enum WebError {
    Bus(ReplyFailure),
    BadForm(String),
}

impl From<ReplyFailure> for WebError {
    fn from(failure: ReplyFailure) -> Self {
        WebError::Bus(failure)
    }
}

impl WebError {
    fn status(&self) -> StatusCode {
        match self {
            WebError::BadForm(_) => StatusCode::BAD_REQUEST,
            WebError::Bus(failure) if failure.code.is_protocol() => StatusCode::BAD_REQUEST,
            WebError::Bus(failure) if failure.code == ErrorCode::Timeout => {
                StatusCode::GATEWAY_TIMEOUT
            }
            WebError::Bus(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            WebError::Bus(failure) => failure.to_string(),
            WebError::BadForm(reason) => reason.clone(),
        };
        warn!(status = status.as_u16(), error = %message, "request failed");
        (status, message).into_response()
    }
}

// ========================================
// Handlers
// ========================================

async fn index(State(state): State<WebState>) -> Result<Html<String>, WebError> {
    let reply = state.client.request(AllPages {}).await?;

    let mut items = String::new();
    for name in &reply.pages {
        items.push_str(&format!(
            "<li><a href=\"/wiki/{}\">{}</a></li>\n",
            encode_segment(name),
            escape_html(name)
        ));
    }
    let body = format!(
        "<h1>Wiki home</h1>\n\
         <form action=\"/create\" method=\"post\">\
         <input type=\"text\" name=\"name\" placeholder=\"New page name\">\
         <button type=\"submit\">Create</button></form>\n\
         <ul>\n{items}</ul>"
    );
    Ok(Html(layout("Wiki home", &body)))
}

async fn render_page(
    State(state): State<WebState>,
    Path(page): Path<String>,
) -> Result<Html<String>, WebError> {
    let reply = state.client.request(GetPage { page: page.clone() }).await?;

    let (id, markdown, new_page) = match (reply.found, reply.id) {
        (true, Some(id)) => (id.to_string(), reply.raw_content.unwrap_or_default(), "no"),
        _ => (String::new(), NEW_PAGE_MARKDOWN.to_string(), "yes"),
    };

    let mut body = format!(
        "<h1>{title}</h1>\n<pre>{content}</pre>\n\
         <form action=\"/save\" method=\"post\">\
         <input type=\"hidden\" name=\"id\" value=\"{id}\">\
         <input type=\"hidden\" name=\"title\" value=\"{title}\">\
         <input type=\"hidden\" name=\"newPage\" value=\"{new_page}\">\
         <textarea name=\"markdown\">{content}</textarea>\
         <button type=\"submit\">Save</button></form>",
        title = escape_html(&page),
        content = escape_html(&markdown),
    );
    if new_page == "no" {
        body.push_str(&format!(
            "\n<form action=\"/delete\" method=\"post\">\
             <input type=\"hidden\" name=\"id\" value=\"{id}\">\
             <button type=\"submit\">Delete</button></form>"
        ));
    }
    Ok(Html(layout(&page, &body)))
}

#[derive(Debug, Deserialize)]
struct SaveForm {
    #[serde(default)]
    id: String,
    title: String,
    #[serde(default)]
    markdown: String,
    #[serde(rename = "newPage", default)]
    new_page: String,
}

async fn save_page(
    State(state): State<WebState>,
    Form(form): Form<SaveForm>,
) -> Result<Redirect, WebError> {
    if form.new_page == "yes" {
        state
            .client
            .request(CreatePage {
                title: form.title.clone(),
                markdown: form.markdown,
            })
            .await?;
        info!(title = %form.title, "page created");
    } else {
        let id = parse_id(&form.id)?;
        state
            .client
            .request(SavePage {
                id,
                markdown: form.markdown,
            })
            .await?;
        info!(id, title = %form.title, "page saved");
    }
    Ok(Redirect::to(&format!("/wiki/{}", encode_segment(&form.title))))
}

#[derive(Debug, Deserialize)]
struct CreateForm {
    #[serde(default)]
    name: String,
}

/// 名前の検証だけ。ページ自体は最初の /save で作られる。
async fn create_page(Form(form): Form<CreateForm>) -> Redirect {
    if form.name.is_empty() {
        Redirect::to("/")
    } else {
        Redirect::to(&format!("/wiki/{}", encode_segment(&form.name)))
    }
}

#[derive(Debug, Deserialize)]
struct DeleteForm {
    #[serde(default)]
    id: String,
}

async fn delete_page(
    State(state): State<WebState>,
    Form(form): Form<DeleteForm>,
) -> Result<StatusCode, WebError> {
    let id = parse_id(&form.id)?;
    state.client.request(DeletePage { id }).await?;
    info!(id, "page deleted");
    Ok(StatusCode::OK)
}

// ========================================
// Helpers
// ========================================

fn parse_id(raw: &str) -> Result<i64, WebError> {
    raw.trim()
        .parse()
        .map_err(|_| WebError::BadForm(format!("invalid page id: {raw:?}")))
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head>\n\
         <body>\n<p><a href=\"/\">Home</a></p>\n{body}\n</body></html>\n",
        escape_html(title)
    )
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Percent-encode one path segment (RFC 3986 unreserved bytes pass through).
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
