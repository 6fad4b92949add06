//! Session module - per-session chat history

pub mod store;

pub use store::{SessionRecord, SessionStore};
