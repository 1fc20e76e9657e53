//! Wire types for storefront login observation and outbound notifications.
//!
//! This crate contains the serde-serializable shapes that cross a boundary:
//! network responses surfaced by the browser session, the classified events
//! and signals derived from them, and the Telegram Bot API payloads used by
//! the notification sink.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization and small accessors
//! * 1:1 with the wire: Field names match what the remote side sends
//! * Stable: Changes only when an upstream payload changes
//!
//! The orchestration that consumes these types lives in `egc-rs`.

pub mod network;
pub mod signals;
pub mod telegram;

pub use network::*;
pub use signals::*;
pub use telegram::*;
