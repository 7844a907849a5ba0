pub mod command_handler;
pub mod errors;
pub mod http_handler;
pub mod hub;
pub mod lifecycle;
pub mod membership;
pub mod outbox;
pub mod registry;
pub mod relay;
pub mod room;
pub mod server;
pub mod ws_handler;
