pub mod event_bus;
pub mod extract;
pub mod markdown;
pub mod normalize;
pub mod ports;
pub mod report;
pub mod runtime;
pub mod session_store;
pub mod state_machine;
pub mod suggest;
pub mod summary;
pub mod synth;
pub mod triggers;

#[cfg(test)]
mod tests;
