//! Build context packaging.
//!
//! Packs a context directory into an uncompressed tar stream. The archive is
//! produced on a blocking task and handed to the uploader chunk by chunk
//! through a bounded channel, so the whole context is never buffered in
//! memory.

use std::io::{self, Write};
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use bakery_core::error::{BakeryError, Result};

/// Streamed archive body handed to the engine client.
pub type ArchiveStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Slot for a packaging failure observed after the stream was handed off.
///
/// A failure inside the packer aborts the upload, so the engine client sees
/// a broken request body rather than the root cause. The packer records the
/// cause here so the caller can attribute the aborted upload to packaging
/// instead of treating the engine as unavailable.
#[derive(Clone, Default)]
pub struct PackagingFault {
    slot: Arc<Mutex<Option<io::Error>>>,
}

impl PackagingFault {
    /// Record the failure that broke the archive stream.
    pub fn record(&self, error: io::Error) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        slot.get_or_insert(error);
    }

    /// Reclassify an engine failure caused by an aborted upload.
    ///
    /// Only engine-availability errors are reattributed; anything the engine
    /// reported about the build itself passes through untouched.
    pub fn classify(&self, error: BakeryError, dir: &Path) -> BakeryError {
        if !matches!(error, BakeryError::EngineUnavailable { .. }) {
            return error;
        }
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.take() {
            Some(cause) => BakeryError::PackagingError {
                dir: dir.display().to_string(),
                message: cause.to_string(),
            },
            None => error,
        }
    }

    #[cfg(test)]
    fn take(&self) -> Option<io::Error> {
        self.slot.lock().unwrap().take()
    }
}

/// A packaged build context: the archive body plus its fault slot.
pub struct PackedArchive {
    pub stream: ArchiveStream,
    pub fault: PackagingFault,
}

/// Packages a directory into an archive stream for upload.
pub trait SourcePackager: Send + Sync {
    fn pack(&self, dir: &Path) -> Result<PackedArchive>;
}

/// Uncompressed tar packager.
pub struct TarPackager;

/// In-flight chunks between the packer task and the uploader.
const CHUNK_CAPACITY: usize = 32;

struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive receiver dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SourcePackager for TarPackager {
    fn pack(&self, dir: &Path) -> Result<PackedArchive> {
        if !dir.is_dir() {
            return Err(BakeryError::PackagingError {
                dir: dir.display().to_string(),
                message: "not a directory".to_string(),
            });
        }

        let (tx, rx) = mpsc::channel(CHUNK_CAPACITY);
        let dir = dir.to_path_buf();
        let fault = PackagingFault::default();
        let packer_fault = fault.clone();

        tokio::task::spawn_blocking(move || {
            let errors = tx.clone();
            let mut builder = tar::Builder::new(ChannelWriter { tx });
            builder.follow_symlinks(false);

            // into_inner finishes the archive and flushes the trailer.
            let result = builder
                .append_dir_all(".", &dir)
                .and_then(|_| builder.into_inner().map(|_| ()));

            if let Err(e) = result {
                // Surfacing an error item aborts the upload; the fault slot
                // keeps the cause for the caller.
                let message = e.to_string();
                packer_fault.record(e);
                let _ = errors.blocking_send(Err(io::Error::new(io::ErrorKind::Other, message)));
            }
        });

        Ok(PackedArchive {
            stream: Box::pin(ReceiverStream::new(rx)),
            fault,
        })
    }
}
