use crate::services::broadcast::BroadcastActor;
use crate::services::vote::BroadcastWebsiteUpdate;
use crate::services::{Connect, Disconnect};
use actix::prelude::*;
use actix_web_actors::ws;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Live catalog feed pushed to subscribers. This replaces polling for vote
/// counts: every successful toggle lands here.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingWebsiteUpdate {
    pub id: crate::db::website::WebsiteId,
    pub upvotes_count: i32,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "website")]
    Website(OutgoingWebsiteUpdate),
}

/// One connected websocket subscriber. Clients only listen; all mutations go
/// through the HTTP API.
pub struct WsClient;

impl WsClient {
    pub fn new() -> WsClient {
        WsClient
    }

    fn send_json<T: Serialize>(&self, ctx: &mut ws::WebsocketContext<Self>, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => ctx.text(json),
            Err(err) => error!("Failed to convert to JSON {}", err),
        }
    }
}

impl Default for WsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Actor for WsClient {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("New ws client");
        let addr = ctx.address();
        BroadcastActor::from_registry().do_send(Connect { addr });
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        info!("Ws client left");
        let addr = ctx.address();
        BroadcastActor::from_registry().do_send(Disconnect { addr });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsClient {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(message) => match message {
                ws::Message::Ping(payload) => ctx.pong(&payload),
                ws::Message::Close(reason) => {
                    debug!("Got close message from WS. Reason: {:#?}", reason);
                    ctx.close(reason)
                }
                message => {
                    warn!("Ignoring unexpected ws message: {:#?}", message);
                }
            },
            Err(err) => {
                error!("ProtocolError in StreamHandler {:#?}", err);
            }
        }
    }
}

impl Handler<BroadcastWebsiteUpdate> for WsClient {
    type Result = ();

    fn handle(&mut self, msg: BroadcastWebsiteUpdate, ctx: &mut Self::Context) {
        self.send_json(
            ctx,
            &OutgoingMessage::Website(OutgoingWebsiteUpdate {
                id: msg.website_id,
                upvotes_count: msg.upvotes_count,
            }),
        )
    }
}
