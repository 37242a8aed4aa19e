use super::{profile::UserId, DbExecutor};
use crate::async_message_handler_with_span;
use actix::prelude::*;
use actix_interop::with_ctx;
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use tracing::debug;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }

    pub fn as_string(&self) -> String {
        self.0.to_hyphenated().to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalSession {
    pub id: SessionId,
    pub user_id: UserId,
}

#[derive(Message, Clone)]
#[rtype(result = "Result<Option<InternalSession>, Report>")]
pub struct SessionById(pub SessionId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<SessionById> for DbExecutor {
        async fn handle(msg: SessionById) -> Result<Option<InternalSession>, Report> {
            let SessionById(session_id) = msg;
            debug!(id = session_id.as_string().as_str(), "Get session by id");
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            let session = sqlx::query_as::<_, InternalSession>(
                "SELECT id, user_id FROM sessions WHERE id = $1",
            )
            .bind(session_id)
            .fetch_optional(&pool)
            .await?;
            Ok(session)
        }
    }
});

#[derive(Message, Clone)]
#[rtype(result = "Result<InternalSession, Report>")]
pub struct SaveSession(pub UserId);

async_message_handler_with_span!({
    impl AsyncSpanHandler<SaveSession> for DbExecutor {
        async fn handle(msg: SaveSession) -> Result<InternalSession, Report> {
            let SaveSession(user_id) = msg;
            debug!(user_id = user_id.0.as_str(), "Save new session for user");
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            let session = sqlx::query_as::<_, InternalSession>(
                "INSERT INTO sessions (id, user_id) VALUES ($1, $2) RETURNING id, user_id",
            )
            .bind(SessionId::new())
            .bind(user_id)
            .fetch_one(&pool)
            .await?;
            Ok(session)
        }
    }
});
