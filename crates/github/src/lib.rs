//! GitHub infrastructure adapter for Projects v2.
//!
//! Implements the two backend ports defined in the [`projects`] crate
//! (`ProjectsRestApi` and `GraphQlApi`) over HTTPS with one shared
//! [`reqwest::Client`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! Endpoint paths, headers, authentication and `Link`-header pagination are
//! handled here; the orchestration layer never sees them.
//!
//! Non-success REST responses are not errors at this layer: they are returned
//! with their status and raw body so the caller decides what they mean.

mod client;
mod link;

pub use client::{ApiConfig, ClientError, GithubClient};
pub use link::parse_link_header;
