use super::{vote::BroadcastWebsiteUpdate, Connect, Disconnect};
use crate::websocket::WsClient;
use actix::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};

/// Fans catalog updates out to every connected websocket client.
#[derive(Default)]
pub struct BroadcastActor {
    clients: HashSet<Addr<WsClient>>,
}

impl BroadcastActor {
    pub fn new() -> Self {
        BroadcastActor {
            clients: HashSet::new(),
        }
    }
}

impl Actor for BroadcastActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("Broadcast actor started");
    }
}

impl Handler<Connect> for BroadcastActor {
    type Result = ();

    fn handle(&mut self, msg: Connect, _ctx: &mut Context<Self>) -> Self::Result {
        debug!("Adding new client to broadcast");
        self.clients.insert(msg.addr);
    }
}

impl Handler<Disconnect> for BroadcastActor {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Context<Self>) -> Self::Result {
        debug!("Removing client from broadcast");
        self.clients.remove(&msg.addr);
    }
}

macro_rules! broadcast_handler {
    ($message_type:ident) => {
        impl Handler<$message_type> for BroadcastActor {
            type Result = ();

            fn handle(&mut self, msg: $message_type, _ctx: &mut Context<Self>) -> Self::Result {
                debug!(
                    "Broadcasting {} to {} clients",
                    stringify!($message_type),
                    self.clients.len()
                );
                for client in &self.clients {
                    client.do_send(msg.clone());
                }
            }
        }
    };
}

broadcast_handler!(BroadcastWebsiteUpdate);

impl SystemService for BroadcastActor {}
impl Supervised for BroadcastActor {}
