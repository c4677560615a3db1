//! Operator console for an ELT job backend.
//!
//! Signs in against the backend, keeps the bearer token in a persistent
//! session store, and drives the operator flows: triggering jobs, following
//! logs, browsing configuration history and previewing data.
pub mod activity;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod flows;
pub mod router;
pub mod session;
pub mod storage;
