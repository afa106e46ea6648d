use std::{
    path::Path,
    sync::{
        mpsc::{self, RecvTimeoutError},
        Arc,
    },
    thread,
    time::Duration,
};

use crate::{
    metadata::reader::{AssemblyMetadata, AssemblyMetadataReader},
    Error, Result,
};

/// Bounds every read of an inner [`AssemblyMetadataReader`] in time.
///
/// Each read runs on its own worker thread. When the timeout expires first, the read is
/// reported as [`Error::Timeout`] and the worker is left to finish on its own; its result is
/// discarded. A hung file therefore costs one parked thread instead of the whole pass.
pub struct TimeoutReader<R: ?Sized> {
    inner: Arc<R>,
    timeout: Duration,
}

impl<R: ?Sized> TimeoutReader<R> {
    /// Wrap `inner`, allowing each read at most `timeout`.
    #[must_use]
    pub fn new(inner: Arc<R>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// The configured per-read timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<R> AssemblyMetadataReader for TimeoutReader<R>
where
    R: AssemblyMetadataReader + ?Sized + 'static,
{
    fn read(&self, path: &Path) -> Result<AssemblyMetadata> {
        let (sender, receiver) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned_path = path.to_path_buf();

        thread::Builder::new()
            .name("dotdeps-metadata".to_string())
            .spawn(move || {
                // The receiver is gone once the read timed out
                let _ = sender.send(inner.read(&owned_path));
            })?;

        match receiver.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(Error::Timeout {
                path: path.to_path_buf(),
                timeout: self.timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Error(format!(
                "Metadata reader for {} terminated without a result",
                path.display()
            ))),
        }
    }
}
