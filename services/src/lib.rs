//! Small shared building blocks used across the Atlas crates.
//!
//! - [`uuid`]: deterministic UUIDv5 derived from arbitrary string ids.
//! - [`ids`]: ASCII-safe embedding ids (`name#key#seq`) and their prefixes.
//! - [`events`]: `{status, message}` progress events pushed through a channel.

pub mod events;
pub mod ids;
pub mod uuid;
