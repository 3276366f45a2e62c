//! Scoped ownership of SDK references.
//!
//! A [`Handle`] owns exactly one reference and releases it exactly once:
//! explicitly through [`Handle::release`], or on drop. After either, the
//! raw reference is gone, so it cannot be used or released again.

use std::fmt;
use std::sync::Arc;

use crate::camera::error::{CameraError, Result};

use super::api::{EdsSdkApi, RawRef};

/// What a [`Handle`] refers to. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    CameraList,
    Camera,
    Volume,
    DirectoryItem,
    Stream,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CameraList => "camera list",
            Self::Camera => "camera",
            Self::Volume => "volume",
            Self::DirectoryItem => "directory item",
            Self::Stream => "stream",
        })
    }
}

/// An owned SDK reference.
pub struct Handle<S: EdsSdkApi> {
    sdk: Arc<S>,
    raw: RawRef,
    kind: HandleKind,
}

impl<S: EdsSdkApi> Handle<S> {
    /// Take ownership of a reference returned by an acquisition call.
    pub fn adopt(sdk: &Arc<S>, raw: RawRef, kind: HandleKind) -> Self {
        Self {
            sdk: Arc::clone(sdk),
            raw,
            kind,
        }
    }

    /// Run an acquisition call and own whatever it returns.
    pub fn acquire(
        sdk: &Arc<S>,
        kind: HandleKind,
        acquire: impl FnOnce(&S) -> Result<RawRef>,
    ) -> Result<Self> {
        let raw = acquire(sdk)?;
        Ok(Self::adopt(sdk, raw, kind))
    }

    pub fn raw(&self) -> RawRef {
        self.raw
    }

    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    pub fn sdk(&self) -> &S {
        &self.sdk
    }

    /// Release now and report the outcome. A null handle releases trivially.
    pub fn release(mut self) -> Result<()> {
        self.release_inner()
    }

    fn release_inner(&mut self) -> Result<()> {
        let raw = std::mem::replace(&mut self.raw, RawRef::NULL);
        if raw.is_null() {
            return Ok(());
        }
        tracing::debug!("Releasing {} {:?}", self.kind, raw);
        self.sdk.release(raw)
    }
}

impl<S: EdsSdkApi> fmt::Debug for Handle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("raw", &self.raw)
            .finish()
    }
}

impl<S: EdsSdkApi> Drop for Handle<S> {
    fn drop(&mut self) {
        let kind = self.kind;
        if let Err(e) = self.release_inner() {
            tracing::warn!("Failed to release {kind}: {e}");
        }
    }
}

/// Combine an operation's outcome with the outcomes of its cleanup steps.
///
/// Cleanup failures never hide the operation's own failure; when both
/// happen they travel together in [`CameraError::Cleanup`].
pub fn merge_cleanup<T>(result: Result<T>, cleanups: Vec<Result<()>>) -> Result<T> {
    let mut failures: Vec<CameraError> = cleanups.into_iter().filter_map(Result::err).collect();
    match result {
        Ok(value) if failures.is_empty() => Ok(value),
        Ok(_) if failures.len() == 1 => Err(failures.remove(0)),
        Ok(_) => {
            let first = failures.remove(0);
            Err(CameraError::Cleanup {
                source: Box::new(first),
                cleanup: failures,
            })
        }
        Err(e) if failures.is_empty() => Err(e),
        Err(e) => Err(CameraError::Cleanup {
            source: Box::new(e),
            cleanup: failures,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::canon::mock::MockEdsSdk;
    use crate::camera::canon::status::EDS_ERR_DEVICE_BUSY;

    #[test]
    fn drop_releases_exactly_once() {
        let sdk = Arc::new(MockEdsSdk::new().with_cameras(1));
        {
            let _list = Handle::acquire(&sdk, HandleKind::CameraList, |s| s.camera_list()).unwrap();
            assert_eq!(sdk.live_refs(), 1);
        }
        assert_eq!(sdk.acquired(), 1);
        assert_eq!(sdk.released(), 1);
        assert_eq!(sdk.live_refs(), 0);
    }

    #[test]
    fn explicit_release_prevents_second_release_on_drop() {
        let sdk = Arc::new(MockEdsSdk::new().with_cameras(1));
        let list = Handle::acquire(&sdk, HandleKind::CameraList, |s| s.camera_list()).unwrap();
        list.release().unwrap();
        assert_eq!(sdk.released(), 1);
    }

    #[test]
    fn null_handle_release_is_a_no_op() {
        let sdk = Arc::new(MockEdsSdk::new());
        let handle = Handle::adopt(&sdk, RawRef::NULL, HandleKind::Stream);
        handle.release().unwrap();
        assert_eq!(sdk.released(), 0);
    }

    #[test]
    fn failed_acquisition_owns_nothing() {
        let sdk = Arc::new(MockEdsSdk::new().with_error("camera_list", EDS_ERR_DEVICE_BUSY));
        let err = Handle::acquire(&sdk, HandleKind::CameraList, |s| s.camera_list()).unwrap_err();
        assert_eq!(err.sdk_code(), Some(EDS_ERR_DEVICE_BUSY));
        assert_eq!(sdk.acquired(), 0);
        assert_eq!(sdk.released(), 0);
    }

    #[test]
    fn release_failure_is_reported() {
        let sdk = Arc::new(MockEdsSdk::new());
        let list = Handle::acquire(&sdk, HandleKind::CameraList, |s| s.camera_list()).unwrap();
        sdk.inject_error("release", EDS_ERR_DEVICE_BUSY);
        assert!(list.release().is_err());
    }

    #[test]
    fn merge_cleanup_keeps_every_failure() {
        let ok: Result<u8> = Ok(1);
        assert_eq!(merge_cleanup(ok, vec![Ok(())]).unwrap(), 1);

        let only_cleanup = merge_cleanup(Ok(1u8), vec![Err(CameraError::SessionClosed)]);
        assert!(matches!(only_cleanup, Err(CameraError::SessionClosed)));

        let op_only: Result<u8> = merge_cleanup(Err(CameraError::CaptureInProgress), vec![Ok(())]);
        assert!(matches!(op_only, Err(CameraError::CaptureInProgress)));

        let both: Result<u8> = merge_cleanup(
            Err(CameraError::CaptureInProgress),
            vec![Err(CameraError::SessionClosed), Ok(())],
        );
        match both {
            Err(CameraError::Cleanup { source, cleanup }) => {
                assert!(matches!(*source, CameraError::CaptureInProgress));
                assert_eq!(cleanup.len(), 1);
            }
            other => panic!("expected Cleanup, got {other:?}"),
        }
    }
}
