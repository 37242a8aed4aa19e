use super::DbExecutor;
use crate::async_message_handler_with_span;
use actix::prelude::*;
use actix_interop::with_ctx;
use chrono::{DateTime, Utc};
use color_eyre::eyre::Report;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Opaque subject identifier issued by the upstream identity provider.
/// This service never sees credentials, only the stable id.
#[derive(Clone, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct UserId(pub String);

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalProfile {
    pub id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Mirrors the identity provider's claims into the local profiles table.
/// Keyed on the subject id, so repeated logins refresh the same row.
#[derive(Message, Clone)]
#[rtype(result = "Result<InternalProfile, Report>")]
pub struct UpsertProfile {
    pub id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

async_message_handler_with_span!({
    impl AsyncSpanHandler<UpsertProfile> for DbExecutor {
        async fn handle(msg: UpsertProfile) -> Result<InternalProfile, Report> {
            let pool = with_ctx(|a: &mut DbExecutor, _| a.pool());
            debug!("Upserting profile {}", msg.id.0);
            let profile = sqlx::query_as::<_, InternalProfile>(
                "INSERT INTO profiles (id, email, display_name, avatar_url, updated_at) \
                 VALUES ($1, $2, $3, $4, now()) \
                 ON CONFLICT (id) DO UPDATE SET \
                   email = EXCLUDED.email, \
                   display_name = EXCLUDED.display_name, \
                   avatar_url = EXCLUDED.avatar_url, \
                   updated_at = now() \
                 RETURNING id, email, display_name, avatar_url, updated_at",
            )
            .bind(msg.id)
            .bind(msg.email)
            .bind(msg.display_name)
            .bind(msg.avatar_url)
            .fetch_one(&pool)
            .await?;
            Ok(profile)
        }
    }
});
