//! egui projection of the chat runtime: conversation, error banner with
//! retry, session sidebar, download surface and settings.

pub mod panels;
pub mod state;
pub mod theme;
