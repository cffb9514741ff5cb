//! Scheduler layer for the tracker
//!
//! This layer runs the per-job control loops. Each tracked job gets its own
//! poller task that repeatedly polls upstream status, drives the state
//! machine, and persists results until the job reaches a terminal state.

pub mod poller;

pub use poller::JobPoller;
