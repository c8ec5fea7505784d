//! # tadohub-domain
//!
//! Pure domain model for the tadohub heating control add-on.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Zones** (heating areas backed by a Home Assistant climate entity)
//! - Define **Schedules** (per-zone time-based target-temperature rules)
//! - Define **Automation descriptors** (the Home Assistant automation derived
//!   from one schedule entry)
//! - Define the **sync plan** (pure diff between installed and desired
//!   automations)
//! - Define **Events** (zone/schedule change records for the event bus)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod automation;
pub mod event;
pub mod schedule;
pub mod snapshot;
pub mod sync;
pub mod zone;
