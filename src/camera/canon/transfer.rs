//! Object-event download protocol.
//!
//! After `TakePicture` the camera holds the new image and raises
//! `DirItemRequestTransfer`. The host answers by copying the item into a
//! file stream and acknowledging with `EdsDownloadComplete`, or by
//! refusing with `EdsDownloadCancel`. Until it does one of the two the
//! camera stays in its wait state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::camera::error::{CameraError, Result};

use super::api::{EdsSdkApi, RawRef};
use super::handle::{merge_cleanup, Handle, HandleKind};
use super::status::{EDS_ERR_INTERNAL_ERROR, EDS_ERR_OK};
use super::types::{
    EdsError, EdsObjectEvent, ACCESS_WRITE, FILE_CREATE_DISPOSITION_CREATE_ALWAYS,
    OBJECT_EVENT_DIR_ITEM_REQUEST_TRANSFER,
};

/// A finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Where the image was written.
    pub path: PathBuf,
    /// File name the camera gave the image.
    pub file_name: String,
    /// Bytes transferred.
    pub size: u64,
}

#[derive(Debug)]
enum TransferState {
    Idle,
    Armed(PathBuf),
    InFlight,
    /// The waiter gave up while the handler was downloading.
    Abandoned,
    Finished(Result<TransferReceipt>),
}

/// Rendezvous between a waiting `shoot` and the object event handler.
///
/// At most one transfer is pending at a time, and each armed transfer
/// produces at most one result. A download the waiter abandoned still
/// blocks the next arm until the handler finishes it.
#[derive(Debug)]
pub struct TransferSlot {
    state: Mutex<TransferState>,
    ready: Condvar,
}

impl Default for TransferSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferSlot {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TransferState::Idle),
            ready: Condvar::new(),
        }
    }

    /// Expect a transfer into `path`.
    pub fn arm(&self, path: PathBuf) -> Result<()> {
        let mut state = self.state.lock();
        if !matches!(*state, TransferState::Idle) {
            return Err(CameraError::CaptureInProgress);
        }
        *state = TransferState::Armed(path);
        Ok(())
    }

    pub fn is_armed(&self) -> bool {
        matches!(*self.state.lock(), TransferState::Armed(_))
    }

    /// Take the armed destination. `None` if nothing is waiting.
    pub fn claim(&self) -> Option<PathBuf> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, TransferState::InFlight) {
            TransferState::Armed(path) => Some(path),
            other => {
                *state = other;
                None
            }
        }
    }

    /// Publish the outcome of a claimed transfer and wake the waiter.
    ///
    /// Returns `false` when the waiter already gave up; the result is
    /// dropped and the slot becomes free again.
    pub fn finish(&self, result: Result<TransferReceipt>) -> bool {
        let mut state = self.state.lock();
        match *state {
            TransferState::InFlight => {
                *state = TransferState::Finished(result);
                self.ready.notify_all();
                true
            }
            TransferState::Abandoned => {
                *state = TransferState::Idle;
                false
            }
            _ => false,
        }
    }

    /// Wait up to `tick` for the outcome. Taking it resets the slot.
    pub fn wait(&self, tick: Duration) -> Option<Result<TransferReceipt>> {
        let mut state = self.state.lock();
        if !matches!(*state, TransferState::Finished(_)) {
            self.ready.wait_for(&mut state, tick);
        }
        match std::mem::replace(&mut *state, TransferState::Idle) {
            TransferState::Finished(result) => Some(result),
            other => {
                *state = other;
                None
            }
        }
    }

    /// Stop waiting for the pending transfer.
    ///
    /// A download already in flight is left to finish, but its result is
    /// discarded and the slot stays busy until then.
    pub fn disarm(&self) {
        let mut state = self.state.lock();
        *state = match std::mem::replace(&mut *state, TransferState::Idle) {
            TransferState::InFlight | TransferState::Abandoned => TransferState::Abandoned,
            _ => TransferState::Idle,
        };
    }
}

/// Object event entry point. Owns the reference to `object`.
///
/// Events other than a transfer request are acknowledged and their
/// reference released. A transfer request with nothing armed is cancelled
/// so the camera does not stay blocked.
pub fn handle_object_event<S: EdsSdkApi>(
    sdk: &Arc<S>,
    slot: &TransferSlot,
    event: EdsObjectEvent,
    object: RawRef,
) -> EdsError {
    let item = Handle::adopt(sdk, object, HandleKind::DirectoryItem);

    if event != OBJECT_EVENT_DIR_ITEM_REQUEST_TRANSFER {
        tracing::debug!("Ignoring object event 0x{event:X}");
        return EDS_ERR_OK;
    }

    let Some(path) = slot.claim() else {
        tracing::warn!("Transfer requested with no capture waiting, cancelling");
        let cancelled = sdk.download_cancel(item.raw());
        return status_of(&merge_cleanup(cancelled, vec![item.release()]));
    };

    let result = download_item(sdk, item, &path);
    match &result {
        Ok(receipt) => tracing::info!(
            "Downloaded {} ({} bytes) to {}",
            receipt.file_name,
            receipt.size,
            receipt.path.display()
        ),
        Err(e) => tracing::error!("Download to {} failed: {e}", path.display()),
    }

    let code = status_of(&result);
    if !slot.finish(result) {
        tracing::warn!("Transfer finished after the capture stopped waiting");
    }
    code
}

/// Copy a directory item into a file at `path` and release the item.
///
/// On failure the transfer is cancelled unless the camera already had its
/// completion acknowledgement.
pub fn download_item<S: EdsSdkApi>(
    sdk: &Arc<S>,
    item: Handle<S>,
    path: &Path,
) -> Result<TransferReceipt> {
    let mut acknowledged = false;
    let result = copy_to_file(sdk, &item, path, &mut acknowledged);

    let mut cleanups = Vec::new();
    if result.is_err() && !acknowledged {
        cleanups.push(sdk.download_cancel(item.raw()));
    }
    cleanups.push(item.release());
    merge_cleanup(result, cleanups)
}

fn copy_to_file<S: EdsSdkApi>(
    sdk: &Arc<S>,
    item: &Handle<S>,
    path: &Path,
    acknowledged: &mut bool,
) -> Result<TransferReceipt> {
    let info = sdk.directory_item_info(item.raw())?;
    tracing::debug!("Transferring {} ({} bytes)", info.file_name(), info.size);

    let stream = Handle::acquire(sdk, HandleKind::Stream, |s| {
        s.create_file_stream(path, FILE_CREATE_DISPOSITION_CREATE_ALWAYS, ACCESS_WRITE)
    })?;

    let copied = sdk
        .download(item.raw(), info.size, stream.raw())
        .and_then(|()| sdk.download_complete(item.raw()));
    *acknowledged = copied.is_ok();
    merge_cleanup(copied, vec![stream.release()])?;

    Ok(TransferReceipt {
        path: path.to_path_buf(),
        file_name: info.file_name(),
        size: info.size,
    })
}

fn status_of<T>(result: &Result<T>) -> EdsError {
    match result {
        Ok(_) => EDS_ERR_OK,
        Err(e) => e.sdk_code().unwrap_or(EDS_ERR_INTERNAL_ERROR),
    }
}
