use crate::db::profile::UserId;
use crate::db::website::{InsertWebsite, InternalWebsite, WebsiteByUrl};
use crate::db::DbExecutor;
use crate::error::ApiError;
use crate::managers::rate_limit::RateLimiter;
use crate::message_handler_with_span;
use crate::span::{SpanHandler, SpanMessage};
use crate::validation::{self, SubmissionInput};
use actix::prelude::*;
use actix_interop::{with_ctx, FutureInterop};
use std::time::Duration;
use tracing::{debug, info, Span};

const SUBMISSION_LIMIT: u32 = 5;
const SUBMISSION_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Submission guard: rate limit, sanitize, validate, reject duplicates,
/// insert pending. Owning the limiter means the check-and-increment runs
/// one message at a time.
pub struct WebsiteActor {
    limiter: RateLimiter,
}

impl WebsiteActor {
    pub fn new() -> Self {
        Self {
            limiter: RateLimiter::new(SUBMISSION_LIMIT, SUBMISSION_WINDOW),
        }
    }
}

impl Default for WebsiteActor {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for WebsiteActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Website actor started");
    }
}

#[derive(Message, Clone)]
#[rtype(result = "Result<InternalWebsite, ApiError>")]
pub struct SubmitWebsite {
    pub caller: UserId,
    pub input: SubmissionInput,
}

message_handler_with_span! {
    impl SpanHandler<SubmitWebsite> for WebsiteActor {
        type Result = ResponseActFuture<Self, <SubmitWebsite as Message>::Result>;

        fn handle(&mut self, msg: SubmitWebsite, _ctx: &mut Context<Self>, _span: Span) -> Self::Result {
            debug!("Handling website submission");
            async move {
                let SubmitWebsite { caller, input } = msg;
                let allowed = with_ctx(|a: &mut WebsiteActor, _| a.limiter.check(&caller.0));
                if !allowed {
                    return Err(ApiError::RateLimited);
                }

                let submission = validation::validate_submission(input)?;

                let existing = DbExecutor::from_registry()
                    .send(SpanMessage::new(WebsiteByUrl(submission.url.clone())))
                    .await??;
                if existing.is_some() {
                    return Err(ApiError::Conflict(
                        "This website has already been submitted",
                    ));
                }

                let website = DbExecutor::from_registry()
                    .send(SpanMessage::new(InsertWebsite {
                        title: submission.title,
                        url: submission.url,
                        description: submission.description,
                        category: submission.category,
                    }))
                    .await??;
                info!("Website {} submitted for review", website.id.0);
                Ok(website)
            }
            .interop_actor_boxed(self)
        }
    }
}

impl SystemService for WebsiteActor {}
impl Supervised for WebsiteActor {}
