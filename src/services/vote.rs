use super::broadcast::BroadcastActor;
use crate::db::profile::UserId;
use crate::db::vote::{DeleteVote, InsertVote, VoteByUserAndWebsite};
use crate::db::website::{UpvoteCount, WebsiteById, WebsiteId, WebsiteStatus};
use crate::db::DbExecutor;
use crate::error::ApiError;
use crate::managers::rate_limit::RateLimiter;
use crate::message_handler_with_span;
use crate::span::{SpanHandler, SpanMessage};
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, Span};

const VOTE_LIMIT: u32 = 30;
const VOTE_WINDOW: Duration = Duration::from_secs(60);

/// Vote-toggle guard. The vote's presence at call time decides the branch;
/// clients never state an intent.
pub struct VoteActor {
    limiter: RateLimiter,
}

impl VoteActor {
    pub fn new() -> Self {
        Self {
            limiter: RateLimiter::new(VOTE_LIMIT, VOTE_WINDOW),
        }
    }
}

impl Default for VoteActor {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for VoteActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Vote actor started");
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Added,
    Removed,
}

#[derive(Clone, Debug)]
pub struct VoteOutcome {
    pub action: VoteAction,
    pub is_voted: bool,
    pub upvotes_count: i32,
}

#[derive(Message, Clone)]
#[rtype(result = "Result<VoteOutcome, ApiError>")]
pub struct ToggleVote {
    pub caller: UserId,
    pub website_id: WebsiteId,
}

/// Pushed to websocket subscribers after every successful toggle.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct BroadcastWebsiteUpdate {
    pub website_id: WebsiteId,
    pub upvotes_count: i32,
}

message_handler_with_span! {
    impl SpanHandler<ToggleVote> for VoteActor {
        type Result = ResponseActFuture<Self, <ToggleVote as Message>::Result>;

        fn handle(&mut self, msg: ToggleVote, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            debug!("Handling vote toggle");
            async move {
                let ToggleVote { caller, website_id } = msg;
                let allowed = with_ctx(|a: &mut VoteActor, _| a.limiter.check(&caller.0));
                if !allowed {
                    return Err(ApiError::RateLimited);
                }

                let website = DbExecutor::from_registry()
                    .send(SpanMessage::new(WebsiteById(website_id)))
                    .await??
                    .ok_or(ApiError::NotFound)?;
                if website.status != WebsiteStatus::Approved {
                    return Err(ApiError::Forbidden(
                        "Cannot vote on pending or rejected websites",
                    ));
                }

                let existing = DbExecutor::from_registry()
                    .send(SpanMessage::new(VoteByUserAndWebsite(
                        caller.clone(),
                        website_id,
                    )))
                    .await??;

                let (action, is_voted) = match existing {
                    Some(_) => {
                        DbExecutor::from_registry()
                            .send(SpanMessage::new(DeleteVote(caller, website_id)))
                            .await??;
                        (VoteAction::Removed, false)
                    }
                    None => {
                        // `None` here means a concurrent toggle inserted the
                        // row first; the vote exists either way, so treat it
                        // as added.
                        DbExecutor::from_registry()
                            .send(SpanMessage::new(InsertVote(caller, website_id)))
                            .await??;
                        (VoteAction::Added, true)
                    }
                };

                // Read back rather than compute: the votes trigger owns the
                // counter.
                let upvotes_count = DbExecutor::from_registry()
                    .send(SpanMessage::new(UpvoteCount(website_id)))
                    .await??;

                BroadcastActor::from_registry().do_send(BroadcastWebsiteUpdate {
                    website_id,
                    upvotes_count,
                });

                Ok(VoteOutcome {
                    action,
                    is_voted,
                    upvotes_count,
                })
            }
            .interop_actor_boxed(self)
        }
    }
}

impl SystemService for VoteActor {}
impl Supervised for VoteActor {}
