pub mod chat;
pub mod messages;
pub mod refresher;
pub mod settings;
pub mod sync;
