//! File-backed schedule repository.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tadohub_app::ports::ScheduleRepository;
use tadohub_domain::error::{StorageError, TadoHubError};
use tadohub_domain::schedule::ScheduleBook;

/// [`ScheduleRepository`] persisting the book as pretty-printed JSON.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous document intact. Write serialization
/// is the caller's job; the schedule service holds a mutex across
/// load-modify-save.
pub struct FileScheduleRepository {
    path: PathBuf,
    backup: bool,
}

impl FileScheduleRepository {
    pub fn new(path: impl Into<PathBuf>, backup: bool) -> Self {
        Self {
            path: path.into(),
            backup,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }
}

impl ScheduleRepository for FileScheduleRepository {
    async fn load(&self) -> Result<ScheduleBook, TadoHubError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            // First start: no schedules yet.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(ScheduleBook::default()),
            Err(err) => return Err(StorageError::Read(err).into()),
        };
        serde_json::from_slice(&bytes).map_err(|err| StorageError::Corrupt(err).into())
    }

    #[tracing::instrument(skip(self, book), fields(path = %self.path.display()))]
    async fn save(&self, book: &ScheduleBook) -> Result<(), TadoHubError> {
        let bytes = serde_json::to_vec_pretty(book).map_err(StorageError::Corrupt)?;

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(StorageError::Write)?;
        }

        if self.backup
            && tokio::fs::try_exists(&self.path).await.unwrap_or(false)
            && let Err(err) = tokio::fs::copy(&self.path, self.sibling(".bak")).await
        {
            tracing::warn!(error = %err, "failed to refresh schedule backup");
        }

        let tmp = self.sibling(".tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(StorageError::Write)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(StorageError::Write)?;
        Ok(())
    }
}
