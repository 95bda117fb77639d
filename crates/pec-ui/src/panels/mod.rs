pub mod chat;
pub mod downloads;
pub mod sessions;
pub mod settings;
