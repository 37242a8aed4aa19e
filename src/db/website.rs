use super::DbExecutor;
use crate::async_message_handler_with_span;
use actix::prelude::*;
use actix_interop::with_ctx;
use chrono::{DateTime, Utc};
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use tracing::debug;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct WebsiteId(pub Uuid);

impl WebsiteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for WebsiteId {
    fn default() -> Self {
        Self::new()
    }
}

/// The fixed category set. Submissions naming anything else are rejected.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(rename = "text")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Tools,
    Education,
    Fun,
    Design,
    Productivity,
}

impl Category {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "tools" => Some(Category::Tools),
            "education" => Some(Category::Education),
            "fun" => Some(Category::Fun),
            "design" => Some(Category::Design),
            "productivity" => Some(Category::Productivity),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(rename = "text")]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WebsiteStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalWebsite {
    pub id: WebsiteId,
    pub title: String,
    pub url: String,
    pub description: String,
    pub category: Category,
    pub status: WebsiteStatus,
    pub upvotes_count: i32,
    pub created_at: DateTime<Utc>,
}

const WEBSITE_COLUMNS: &str =
    "id, title, url, description, category, status, upvotes_count, created_at";

#[derive(Message, Clone)]
#[rtype(result = "Result<Option<InternalWebsite>, Report>")]
pub struct WebsiteById(pub WebsiteId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<WebsiteById> for DbExecutor {
        async fn handle(msg: WebsiteById) -> Result<Option<InternalWebsite>, Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            let WebsiteById(website_id) = msg;
            debug!("Retrieving website by id {}", website_id.0);
            let sql = format!("SELECT {} FROM websites WHERE id = $1", WEBSITE_COLUMNS);
            let website = sqlx::query_as::<_, InternalWebsite>(&sql)
                .bind(website_id)
                .fetch_optional(&pool)
                .await?;
            Ok(website)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<Option<InternalWebsite>, Report>")]
pub struct WebsiteByUrl(pub String);

async_message_handler_with_span!({
    impl AsyncSpanHandler<WebsiteByUrl> for DbExecutor {
        async fn handle(msg: WebsiteByUrl) -> Result<Option<InternalWebsite>, Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            let WebsiteByUrl(url) = msg;
            debug!("Looking up website by url");
            let sql = format!("SELECT {} FROM websites WHERE url = $1", WEBSITE_COLUMNS);
            let website = sqlx::query_as::<_, InternalWebsite>(&sql)
                .bind(url)
                .fetch_optional(&pool)
                .await?;
            Ok(website)
        }
    }
});

/// Inserts a new website. Status is always `pending` and the vote counter
/// starts at zero; moderation flips the status outside this service.
#[derive(Message, Clone)]
#[rtype(result = "Result<InternalWebsite, Report>")]
pub struct InsertWebsite {
    pub title: String,
    pub url: String,
    pub description: String,
    pub category: Category,
}

async_message_handler_with_span!({
    impl AsyncSpanHandler<InsertWebsite> for DbExecutor {
        async fn handle(msg: InsertWebsite) -> Result<InternalWebsite, Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            debug!("Inserting new pending website");
            let sql = format!(
                "INSERT INTO websites (id, title, url, description, category, status, upvotes_count) \
                 VALUES ($1, $2, $3, $4, $5, 'pending', 0) \
                 RETURNING {}",
                WEBSITE_COLUMNS
            );
            let website = sqlx::query_as::<_, InternalWebsite>(&sql)
                .bind(WebsiteId::new())
                .bind(msg.title)
                .bind(msg.url)
                .bind(msg.description)
                .bind(msg.category)
                .fetch_one(&pool)
                .await?;
            Ok(website)
        }
    }
});

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SortOrder {
    Upvotes,
    Newest,
}

/// Public listing: approved websites only, optionally filtered by a search
/// term (title/description/category substring) and an exact category.
#[derive(Message, Clone)]
#[rtype(result = "Result<Vec<InternalWebsite>, Report>")]
pub struct ListWebsites {
    pub search: Option<String>,
    pub category: Option<Category>,
    pub sort: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

async_message_handler_with_span!({
    impl AsyncSpanHandler<ListWebsites> for DbExecutor {
        async fn handle(msg: ListWebsites) -> Result<Vec<InternalWebsite>, Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            debug!("Listing approved websites");

            let mut sql = format!(
                "SELECT {} FROM websites WHERE status = 'approved'",
                WEBSITE_COLUMNS
            );
            let pattern = msg.search.as_ref().map(|term| format!("%{}%", term));
            let mut params = 0;
            if pattern.is_some() {
                params += 1;
                sql.push_str(&format!(
                    " AND (title ILIKE ${i} OR description ILIKE ${i} OR category ILIKE ${i})",
                    i = params
                ));
            }
            if msg.category.is_some() {
                params += 1;
                sql.push_str(&format!(" AND category = ${}", params));
            }
            match msg.sort {
                SortOrder::Upvotes => sql.push_str(" ORDER BY upvotes_count DESC, created_at DESC"),
                SortOrder::Newest => sql.push_str(" ORDER BY created_at DESC"),
            }
            sql.push_str(&format!(" LIMIT ${} OFFSET ${}", params + 1, params + 2));

            let mut query = sqlx::query_as::<_, InternalWebsite>(&sql);
            if let Some(pattern) = pattern {
                query = query.bind(pattern);
            }
            if let Some(category) = msg.category {
                query = query.bind(category);
            }
            let websites = query
                .bind(msg.limit)
                .bind(msg.offset)
                .fetch_all(&pool)
                .await?;
            Ok(websites)
        }
    }
});

#[derive(Clone, Debug, sqlx::FromRow)]
struct UpvoteCountRow {
    upvotes_count: i32,
}

/// Read-after-write count; the trigger on `votes` maintains the column.
#[derive(Message, Clone)]
#[rtype(result = "Result<i32, Report>")]
pub struct UpvoteCount(pub WebsiteId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<UpvoteCount> for DbExecutor {
        async fn handle(msg: UpvoteCount) -> Result<i32, Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            let UpvoteCount(website_id) = msg;
            let row = sqlx::query_as::<_, UpvoteCountRow>(
                "SELECT upvotes_count FROM websites WHERE id = $1",
            )
            .bind(website_id)
            .fetch_optional(&pool)
            .await?;
            Ok(row.map(|row| row.upvotes_count).unwrap_or(0))
        }
    }
});
