//! Schedule repository port — persistence for the zone → schedule mapping.

use std::future::Future;

use tadohub_domain::error::TadoHubError;
use tadohub_domain::schedule::ScheduleBook;

/// Repository for the persisted schedule book.
///
/// `save` must be atomic: after a crash the file holds either the old
/// complete content or the new complete content, never a partial write.
pub trait ScheduleRepository {
    /// Load the book. A missing file yields an empty book, not an error.
    fn load(&self) -> impl Future<Output = Result<ScheduleBook, TadoHubError>> + Send;

    /// Atomically replace the persisted book.
    fn save(&self, book: &ScheduleBook) -> impl Future<Output = Result<(), TadoHubError>> + Send;
}

impl<T: ScheduleRepository + Send + Sync> ScheduleRepository for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<ScheduleBook, TadoHubError>> + Send {
        (**self).load()
    }

    fn save(&self, book: &ScheduleBook) -> impl Future<Output = Result<(), TadoHubError>> + Send {
        (**self).save(book)
    }
}
