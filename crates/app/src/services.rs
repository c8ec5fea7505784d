//! Application services — the inbound use-case layer.

pub mod schedule_service;
pub mod sync_service;
pub mod zone_service;
