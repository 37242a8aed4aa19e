use crate::websocket::WsClient;
use actix::prelude::*;

pub mod broadcast;
pub mod session;
pub mod vote;
pub mod website;

/// Subscribes a websocket client to live catalog updates.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Connect {
    pub addr: Addr<WsClient>,
}

#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub addr: Addr<WsClient>,
}
