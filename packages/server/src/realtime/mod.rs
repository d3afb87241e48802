//! Best-effort realtime fan-out.
//!
//! One in-process broadcast channel; WebSocket clients subscribe and filter
//! by the rooms they have joined. Nothing is persisted and missed messages
//! are not replayed — clients reconcile over REST on reconnect.

pub mod hub;
pub mod ws;

pub use hub::Hub;
