//! Data Transfer Objects for the upstream status and persistence APIs
//!
//! These mirror the JSON bodies exchanged with the status proxy and the
//! internal save endpoint, camelCase on the wire.

pub mod save;
pub mod status;
