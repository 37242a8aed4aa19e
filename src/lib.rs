pub mod db;
pub mod error;
pub mod log;
pub mod managers;
pub mod server;
pub mod services;
pub mod span;
pub mod validation;
pub mod websocket;
