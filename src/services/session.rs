use crate::async_message_handler_with_span;
use crate::db::profile::{InternalProfile, UpsertProfile, UserId};
use crate::db::session::{InternalSession, SaveSession, SessionById, SessionId};
use crate::db::DbExecutor;
use crate::span::SpanMessage;
use actix::prelude::*;
use color_eyre::eyre::Report;
use tracing::{debug, info};

/// Resolves callers from session credentials and mirrors identity-provider
/// claims into local profiles. The login flow that produces the claims lives
/// upstream; this actor only ever sees its output.
#[derive(Default)]
pub struct SessionActor;

impl Actor for SessionActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Session actor started");
    }
}

impl SystemService for SessionActor {}
impl Supervised for SessionActor {}

/// Maps a presented session id to the caller's user id. `None` in or an
/// unknown session out both mean "unauthenticated".
#[derive(Message, Clone)]
#[rtype(result = "Result<Option<UserId>, Report>")]
pub struct Authenticate(pub Option<SessionId>);

async_message_handler_with_span!({
    impl AsyncSpanHandler<Authenticate> for SessionActor {
        async fn handle(msg: Authenticate) -> Result<Option<UserId>, Report> {
            let session_id = match msg.0 {
                Some(session_id) => session_id,
                None => return Ok(None),
            };
            debug!("Resolving caller from session");
            let session = DbExecutor::from_registry()
                .send(SpanMessage::new(SessionById(session_id)))
                .await??;
            Ok(session.map(|session| session.user_id))
        }
    }
});

/// Identity-provider claims for the logged-in caller.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<SyncedIdentity, Report>")]
pub struct SyncProfile {
    pub id: UserId,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SyncedIdentity {
    pub profile: InternalProfile,
    pub session: InternalSession,
}

async_message_handler_with_span!({
    impl AsyncSpanHandler<SyncProfile> for SessionActor {
        async fn handle(msg: SyncProfile) -> Result<SyncedIdentity, Report> {
            debug!("Syncing profile {}", msg.id.0);
            // Display name falls back to the email local part.
            let display_name = msg.name.clone().or_else(|| {
                msg.email
                    .as_ref()
                    .map(|email| email.split('@').next().unwrap_or(email).to_owned())
            });
            let profile = DbExecutor::from_registry()
                .send(SpanMessage::new(UpsertProfile {
                    id: msg.id,
                    email: msg.email,
                    display_name,
                    avatar_url: msg.picture,
                }))
                .await??;
            let session = DbExecutor::from_registry()
                .send(SpanMessage::new(SaveSession(profile.id.clone())))
                .await??;
            Ok(SyncedIdentity { profile, session })
        }
    }
});
