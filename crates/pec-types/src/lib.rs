pub mod message;
pub mod event;
pub mod config;
pub mod error;
pub mod session;
pub mod design;
pub mod document;


pub use error::PecError;
pub type Result<T> = std::result::Result<T, PecError>;
