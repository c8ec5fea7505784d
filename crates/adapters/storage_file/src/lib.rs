//! # tadohub-adapter-storage-file
//!
//! Schedule persistence as a single JSON document on disk.
//!
//! ## Responsibilities
//! - Implement the `ScheduleRepository` port over one JSON file
//! - Replace the file atomically (write-then-rename) so readers never see
//!   a half-written document
//! - Optionally keep a `.bak` copy of the previous document
//!
//! ## Dependency rule
//! Depends on `tadohub-app` (for the port trait) and `tadohub-domain`.

pub mod repository;

pub use repository::FileScheduleRepository;
