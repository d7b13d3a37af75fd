//! Travel journal client: backend REST access, photo uploads through
//! presigned URLs, location search, and the entry workflow that keeps the
//! in-memory list reconciled with the backend.

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod geocode;
pub mod notify;
pub mod session;
pub mod transport;
pub mod upload;
pub mod workflow;
