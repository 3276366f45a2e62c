//! Safe EDSDK wrapper.
//!
//! Only compiled when the `canon` feature is enabled and the EDSDK library
//! is available. Production code uses this; tests use `MockEdsSdk` instead.
//! Lifetime of the SDK itself (initialise/terminate) is managed by
//! [`SdkRuntime`], so one process-wide runtime is exposed via [`EdsSdk::shared`].

use std::collections::HashMap;
use std::ffi::{c_void, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::camera::error::{CameraError, Result};

use super::api::{EdsSdkApi, ObjectEventCallback, RawRef};
use super::ffi;
use super::runtime::SdkRuntime;
use super::status::{self, EDS_ERR_INTERNAL_ERROR, EDS_ERR_INVALID_HANDLE, EDS_ERR_INVALID_INDEX};
use super::types::*;

static SHARED: OnceLock<Arc<SdkRuntime<EdsSdk>>> = OnceLock::new();

/// Safe wrapper around the Canon EDSDK.
///
/// Keeps every registered object event callback alive until it is replaced
/// or removed, since the SDK only holds a raw context pointer to it.
#[derive(Default)]
pub struct EdsSdk {
    handlers: Mutex<HashMap<usize, Box<ObjectEventCallback>>>,
}

impl EdsSdk {
    /// The process-wide runtime. EDSDK state is global, so there is only one.
    pub fn shared() -> Arc<SdkRuntime<EdsSdk>> {
        Arc::clone(SHARED.get_or_init(|| SdkRuntime::new(EdsSdk::default())))
    }
}

/// Called by the SDK on its notification thread.
///
/// `context` points at the boxed callback registered for the camera.
unsafe extern "system" fn object_event_trampoline(
    event: EdsObjectEvent,
    object: EdsBaseRef,
    context: *mut c_void,
) -> EdsError {
    if context.is_null() {
        ffi::EdsRelease(object);
        return status::EDS_ERR_OK;
    }
    // SAFETY: `context` was produced from a `Box<ObjectEventCallback>` that
    // stays in the handler map until it is unregistered.
    let callback = &*(context as *const ObjectEventCallback);
    match catch_unwind(AssertUnwindSafe(|| callback(event, RawRef::from_ptr(object)))) {
        Ok(code) => code,
        Err(_) => {
            tracing::error!("Object event handler panicked on event 0x{event:X}");
            EDS_ERR_INTERNAL_ERROR
        }
    }
}

fn c_path(path: &Path) -> Result<CString> {
    path.to_str()
        .and_then(|s| CString::new(s).ok())
        .ok_or_else(|| CameraError::InvalidPath(path.display().to_string()))
}

impl EdsSdkApi for EdsSdk {
    fn initialize(&self) -> Result<()> {
        status::check(unsafe { ffi::EdsInitializeSDK() })
    }

    fn terminate(&self) -> Result<()> {
        status::check(unsafe { ffi::EdsTerminateSDK() })
    }

    fn camera_list(&self) -> Result<RawRef> {
        let mut list: EdsBaseRef = std::ptr::null_mut();
        status::check(unsafe { ffi::EdsGetCameraList(&mut list) })?;
        Ok(RawRef::from_ptr(list))
    }

    fn child_count(&self, parent: RawRef) -> Result<u32> {
        let mut count: u32 = 0;
        status::check(unsafe { ffi::EdsGetChildCount(parent.as_ptr(), &mut count) })?;
        Ok(count)
    }

    fn child_at_index(&self, parent: RawRef, index: u32) -> Result<RawRef> {
        let index = i32::try_from(index).map_err(|_| status::failure(EDS_ERR_INVALID_INDEX))?;
        let mut child: EdsBaseRef = std::ptr::null_mut();
        status::check(unsafe { ffi::EdsGetChildAtIndex(parent.as_ptr(), index, &mut child) })?;
        Ok(RawRef::from_ptr(child))
    }

    fn release(&self, object: RawRef) -> Result<()> {
        if unsafe { ffi::EdsRelease(object.as_ptr()) } == ffi::RELEASE_FAILED {
            return Err(status::failure(EDS_ERR_INVALID_HANDLE).into());
        }
        Ok(())
    }

    fn device_info(&self, camera: RawRef) -> Result<EdsDeviceInfo> {
        let mut info = EdsDeviceInfo::zeroed();
        status::check(unsafe { ffi::EdsGetDeviceInfo(camera.as_ptr(), &mut info) })?;
        Ok(info)
    }

    fn open_session(&self, camera: RawRef) -> Result<()> {
        status::check(unsafe { ffi::EdsOpenSession(camera.as_ptr()) })
    }

    fn close_session(&self, camera: RawRef) -> Result<()> {
        status::check(unsafe { ffi::EdsCloseSession(camera.as_ptr()) })
    }

    fn get_property(&self, object: RawRef, prop: EdsPropertyID) -> Result<u32> {
        let mut value: u32 = 0;
        status::check(unsafe {
            ffi::EdsGetPropertyData(
                object.as_ptr(),
                prop,
                0,
                std::mem::size_of::<u32>() as u32,
                (&mut value as *mut u32).cast(),
            )
        })?;
        Ok(value)
    }

    fn set_property(&self, object: RawRef, prop: EdsPropertyID, value: u32) -> Result<()> {
        status::check(unsafe {
            ffi::EdsSetPropertyData(
                object.as_ptr(),
                prop,
                0,
                std::mem::size_of::<u32>() as u32,
                (&value as *const u32).cast(),
            )
        })
    }

    fn property_desc(&self, object: RawRef, prop: EdsPropertyID) -> Result<EdsPropertyDesc> {
        let mut raw = EdsPropertyDescRaw::zeroed();
        status::check(unsafe { ffi::EdsGetPropertyDesc(object.as_ptr(), prop, &mut raw) })?;
        Ok(EdsPropertyDesc::from(&raw))
    }

    fn send_command(&self, camera: RawRef, command: EdsCameraCommand, param: i32) -> Result<()> {
        status::check(unsafe { ffi::EdsSendCommand(camera.as_ptr(), command, param) })
    }

    fn set_capacity(&self, camera: RawRef, capacity: EdsCapacity) -> Result<()> {
        status::check(unsafe { ffi::EdsSetCapacity(camera.as_ptr(), capacity) })
    }

    fn volume_info(&self, volume: RawRef) -> Result<EdsVolumeInfo> {
        let mut info = EdsVolumeInfo::zeroed();
        status::check(unsafe { ffi::EdsGetVolumeInfo(volume.as_ptr(), &mut info) })?;
        Ok(info)
    }

    fn directory_item_info(&self, item: RawRef) -> Result<EdsDirectoryItemInfo> {
        let mut info = EdsDirectoryItemInfo::zeroed();
        status::check(unsafe { ffi::EdsGetDirectoryItemInfo(item.as_ptr(), &mut info) })?;
        Ok(info)
    }

    fn create_file_stream(&self, path: &Path, disposition: u32, access: u32) -> Result<RawRef> {
        let name = c_path(path)?;
        let mut stream: EdsBaseRef = std::ptr::null_mut();
        status::check(unsafe {
            ffi::EdsCreateFileStream(name.as_ptr(), disposition, access, &mut stream)
        })?;
        Ok(RawRef::from_ptr(stream))
    }

    fn download(&self, item: RawRef, size: u64, stream: RawRef) -> Result<()> {
        status::check(unsafe { ffi::EdsDownload(item.as_ptr(), size, stream.as_ptr()) })
    }

    fn download_complete(&self, item: RawRef) -> Result<()> {
        status::check(unsafe { ffi::EdsDownloadComplete(item.as_ptr()) })
    }

    fn download_cancel(&self, item: RawRef) -> Result<()> {
        status::check(unsafe { ffi::EdsDownloadCancel(item.as_ptr()) })
    }

    fn set_object_event_handler(
        &self,
        camera: RawRef,
        event: EdsObjectEvent,
        handler: Option<ObjectEventCallback>,
    ) -> Result<()> {
        let mut handlers = self.handlers.lock();
        match handler {
            Some(handler) => {
                let boxed = Box::new(handler);
                let context = (&*boxed as *const ObjectEventCallback).cast_mut().cast();
                status::check(unsafe {
                    ffi::EdsSetObjectEventHandler(
                        camera.as_ptr(),
                        event,
                        Some(object_event_trampoline),
                        context,
                    )
                })?;
                // The previous callback is only freed once the SDK points elsewhere.
                handlers.insert(camera.0, boxed);
            }
            None => {
                status::check(unsafe {
                    ffi::EdsSetObjectEventHandler(
                        camera.as_ptr(),
                        event,
                        None,
                        std::ptr::null_mut(),
                    )
                })?;
                handlers.remove(&camera.0);
            }
        }
        Ok(())
    }

    fn get_event(&self) -> Result<()> {
        status::check(unsafe { ffi::EdsGetEvent() })
    }
}
