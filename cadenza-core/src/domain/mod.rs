//! Core domain types
//!
//! This module contains the core domain structures used across Cadenza services.
//! These types represent the fundamental business entities and are shared between
//! the tracker (for polling and persistence) and the gateway client (for transfer).

pub mod job;
pub mod track;
pub mod upstream;
