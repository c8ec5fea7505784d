//! # tadohub-adapter-hass
//!
//! Home Assistant adapter built on [reqwest](https://docs.rs/reqwest) and
//! [tokio-tungstenite](https://docs.rs/tokio-tungstenite).
//!
//! ## Responsibilities
//! - Implement the `HomeAssistant` port against the REST API
//!   (`/api/states`, `/api/services/…`, `/api/config/automation/config/…`)
//! - Keep the zone cache current by subscribing to `state_changed` events
//!   over the WebSocket API, reconnecting with backoff when the connection
//!   drops
//! - Map transport failures into the domain's `HomeAssistantError` taxonomy
//!
//! ## Dependency rule
//! Depends on `tadohub-app` (for the port trait and zone service) and
//! `tadohub-domain`. Never leaks reqwest or tungstenite types upward.

pub mod client;
pub mod listener;

pub use client::{HassClient, HassConfig};
pub use listener::StateChangedListener;
