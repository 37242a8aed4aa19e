use actix::prelude::*;
use actix::registry::SystemRegistry;
use actix_web::http::{header, Cookie};
use actix_web::{web, Error, HttpMessage, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;

use crate::db::profile::UserId;
use crate::db::session::SessionId;
use crate::db::website::{
    Category, InternalWebsite, ListWebsites, SortOrder, WebsiteId, WebsiteStatus,
};
use crate::db::DbExecutor;
use crate::error::ApiError;
use crate::services::broadcast::BroadcastActor;
use crate::services::session::{Authenticate, SessionActor, SyncProfile};
use crate::services::vote::{ToggleVote, VoteActor};
use crate::services::website::{SubmitWebsite, WebsiteActor};
use crate::span::SpanMessage;
use crate::validation::SubmissionInput;
use crate::websocket;

const SESSION_COOKIE: &str = "session_id";
const DEFAULT_PAGE_SIZE: i64 = 12;
const MAX_PAGE_SIZE: i64 = 50;

pub fn register_db_actor(pool: PgPool) {
    SystemRegistry::set(DbExecutor(pool).start());
}

pub fn register_system_actors() {
    SystemRegistry::set(WebsiteActor::new().start());
    SystemRegistry::set(VoteActor::new().start());
    SystemRegistry::set(SessionActor::default().start());
    SystemRegistry::set(BroadcastActor::new().start());
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws/").to(ws_route))
        .service(web::resource("/api/websites").route(web::get().to(list_websites)))
        .service(web::resource("/api/submit").route(web::post().to(submit_website)))
        .service(web::resource("/api/vote").route(web::post().to(toggle_vote)))
        .service(web::resource("/api/auth/sync").route(web::post().to(sync_profile)));
}

async fn ws_route(req: HttpRequest, stream: web::Payload) -> Result<HttpResponse, Error> {
    ws::start(websocket::WsClient::new(), &req, stream)
}

/// The presented credential: `session_id` cookie or `Authorization: Bearer`.
/// Anything unparseable counts as no credential at all.
fn session_id_from(req: &HttpRequest) -> Option<SessionId> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if let Some(session_id) = SessionId::parse(cookie.value()) {
            return Some(session_id);
        }
    }
    let header = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;
    SessionId::parse(token)
}

async fn require_caller(req: &HttpRequest) -> Result<UserId, ApiError> {
    let caller = SessionActor::from_registry()
        .send(SpanMessage::new(Authenticate(session_id_from(req))))
        .await??;
    caller.ok_or(ApiError::Unauthenticated)
}

#[derive(Serialize)]
struct WebsiteJson {
    id: WebsiteId,
    title: String,
    url: String,
    description: String,
    category: Category,
    status: WebsiteStatus,
    upvotes_count: i32,
    created_at: DateTime<Utc>,
}

impl From<InternalWebsite> for WebsiteJson {
    fn from(website: InternalWebsite) -> Self {
        Self {
            id: website.id,
            title: website.title,
            url: website.url,
            description: website.description,
            category: website.category,
            status: website.status,
            upvotes_count: website.upvotes_count,
            created_at: website.created_at,
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    q: Option<String>,
    category: Option<String>,
    sort: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_websites(query: web::Query<ListQuery>) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let category = match query.category.as_deref() {
        None | Some("all") => None,
        Some(value) => {
            Some(Category::parse(value).ok_or(ApiError::Validation("Invalid category"))?)
        }
    };
    let sort = match query.sort.as_deref() {
        Some("newest") => SortOrder::Newest,
        _ => SortOrder::Upvotes,
    };
    let search = query.q.filter(|term| !term.trim().is_empty());

    let websites = DbExecutor::from_registry()
        .send(SpanMessage::new(ListWebsites {
            search,
            category,
            sort,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1).min(MAX_PAGE_SIZE),
            offset: query.offset.unwrap_or(0).max(0),
        }))
        .await??;

    let websites: Vec<WebsiteJson> = websites.into_iter().map(WebsiteJson::from).collect();
    Ok(HttpResponse::Ok().json(json!({ "success": true, "websites": websites })))
}

#[derive(Deserialize)]
struct SubmitRequest {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    category: Option<String>,
}

async fn submit_website(
    req: HttpRequest,
    body: web::Json<SubmitRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = require_caller(&req).await?;
    let body = body.into_inner();
    let website = WebsiteActor::from_registry()
        .send(SpanMessage::new(SubmitWebsite {
            caller,
            input: SubmissionInput {
                title: body.title,
                url: body.url,
                description: body.description,
                category: body.category,
            },
        }))
        .await??;
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Website submitted successfully and is pending approval",
        "website": WebsiteJson::from(website),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteRequest {
    website_id: String,
}

async fn toggle_vote(
    req: HttpRequest,
    body: web::Json<VoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let caller = require_caller(&req).await?;
    let website_id = WebsiteId::parse(&body.website_id).ok_or(ApiError::NotFound)?;
    let outcome = VoteActor::from_registry()
        .send(SpanMessage::new(ToggleVote { caller, website_id }))
        .await??;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "action": outcome.action,
        "isVoted": outcome.is_voted,
        "upvotesCount": outcome.upvotes_count,
    })))
}

#[derive(Deserialize)]
struct SyncRequest {
    sub: Option<String>,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

async fn sync_profile(body: web::Json<SyncRequest>) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let sub = body
        .sub
        .filter(|sub| !sub.is_empty())
        .ok_or(ApiError::Validation("Subject id is required"))?;

    let identity = SessionActor::from_registry()
        .send(SpanMessage::new(SyncProfile {
            id: UserId(sub),
            email: body.email,
            name: body.name,
            picture: body.picture,
        }))
        .await??;

    let cookie = Cookie::build(SESSION_COOKIE, identity.session.id.as_string())
        .path("/")
        .http_only(true)
        .finish();
    Ok(HttpResponse::Ok().cookie(cookie).json(json!({
        "success": true,
        "sessionId": identity.session.id,
        "profile": {
            "id": identity.profile.id,
            "email": identity.profile.email,
            "display_name": identity.profile.display_name,
            "avatar_url": identity.profile.avatar_url,
        },
    })))
}
