//! # tadohub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `HomeAssistant` — entity state reads, service calls, automation config
//!   - `ScheduleRepository` — load/save for the schedule book
//!   - `EventPublisher` — broadcast of domain events
//! - Define **driving/inbound ports** as use-case structs:
//!   - `ZoneService` — zone cache, commands, away/home
//!   - `ScheduleService` — schedule CRUD under a single writer lock
//!   - `SyncService` — the automation reconciliation pass
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `tadohub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod services;
