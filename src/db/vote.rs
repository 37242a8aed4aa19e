use super::{profile::UserId, website::WebsiteId, DbExecutor};
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
pub struct VoteId(pub Uuid);

impl VoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for VoteId {
    fn default() -> Self {
        Self::new()
    }
}

/// One row per (user, website) pair; existence means "has upvoted".
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalVote {
    pub id: VoteId,
    pub user_id: UserId,
    pub website_id: WebsiteId,
    pub created_at: DateTime<Utc>,
}

#[derive(Message, Clone)]
#[rtype(result = "Result<Option<InternalVote>, Report>")]
pub struct VoteByUserAndWebsite(pub UserId, pub WebsiteId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<VoteByUserAndWebsite> for DbExecutor {
        async fn handle(msg: VoteByUserAndWebsite) -> Result<Option<InternalVote>, Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            let VoteByUserAndWebsite(user_id, website_id) = msg;
            debug!("Looking up vote for user on website {}", website_id.0);
            let vote = sqlx::query_as::<_, InternalVote>(
                "SELECT id, user_id, website_id, created_at FROM votes \
                 WHERE user_id = $1 AND website_id = $2",
            )
            .bind(user_id)
            .bind(website_id)
            .fetch_optional(&pool)
            .await?;
            Ok(vote)
        }
    }
});

/// Adds a vote. Returns `None` when the `(user_id, website_id)` uniqueness
/// constraint already holds a row, which makes a concurrent duplicate add an
/// idempotent no-op instead of an error.
#[derive(Message, Clone)]
#[rtype(result = "Result<Option<InternalVote>, Report>")]
pub struct InsertVote(pub UserId, pub WebsiteId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<InsertVote> for DbExecutor {
        async fn handle(msg: InsertVote) -> Result<Option<InternalVote>, Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            let InsertVote(user_id, website_id) = msg;
            debug!("Inserting vote for website {}", website_id.0);
            let vote = sqlx::query_as::<_, InternalVote>(
                "INSERT INTO votes (id, user_id, website_id) VALUES ($1, $2, $3) \
                 ON CONFLICT (user_id, website_id) DO NOTHING \
                 RETURNING id, user_id, website_id, created_at",
            )
            .bind(VoteId::new())
            .bind(user_id)
            .bind(website_id)
            .fetch_optional(&pool)
            .await?;
            Ok(vote)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<(), Report>")]
pub struct DeleteVote(pub UserId, pub WebsiteId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<DeleteVote> for DbExecutor {
        async fn handle(msg: DeleteVote) -> Result<(), Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            let DeleteVote(user_id, website_id) = msg;
            debug!("Deleting vote for website {}", website_id.0);
            sqlx::query("DELETE FROM votes WHERE user_id = $1 AND website_id = $2")
                .bind(user_id)
                .bind(website_id)
                .execute(&pool)
                .await?;
            Ok(())
        }
    }
});
