pub mod client;
pub mod protocol;
pub mod websocket_server;
