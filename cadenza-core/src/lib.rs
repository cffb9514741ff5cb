//! Cadenza Core
//!
//! Core types and pure logic for the Cadenza generation tracker.
//!
//! This crate contains:
//! - Domain types: Core business entities (Job, Track, upstream status)
//! - DTOs: Data transfer objects for the upstream status and save APIs
//! - Merge engine: identity-keyed combination of partial track results
//! - Status interpreter: the job state machine driven by polled status

pub mod domain;
pub mod dto;
pub mod interpret;
pub mod merge;
