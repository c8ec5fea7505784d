//! # tadohub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON API** for zones, schedules, away/home, and manual
//!   synchronisation (`/api/zones`, `/api/schedules`, …)
//! - Push live updates as **Server-Sent Events** on `/api/events/stream`
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application errors into `{error, detail}` JSON responses
//!
//! ## Dependency rule
//! Depends on `tadohub-app` (for port traits and services) and
//! `tadohub-domain` (for types used in request/response mapping). Never
//! leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
