//! HTTP middleware stack.
//!
//! - [`auth`] – bearer-token gates for `/v1` and `/admin`.
//! - [`cors`] – CORS layer built from the configured origin list.
//! - [`trace`] – per-request trace id, span and small-body logging.

pub mod auth;
pub mod cors;
pub mod trace;
