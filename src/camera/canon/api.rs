//! `EdsSdkApi` trait, the seam between EDSDK and everything above it.
//!
//! The real `EdsSdk` and the `MockEdsSdk` both implement this trait,
//! so every layer above it is generic over the SDK implementation.
//! Each method passes the raw status code through `status::check`
//! before returning.

use std::path::Path;
use std::sync::Arc;

use crate::camera::error::Result;

use super::types::{
    EdsCameraCommand, EdsCapacity, EdsDeviceInfo, EdsDirectoryItemInfo, EdsError,
    EdsObjectEvent, EdsPropertyDesc, EdsPropertyID, EdsVolumeInfo,
};

/// Opaque SDK reference (camera list, camera, volume, directory item, stream).
///
/// For the real SDK this is the `EdsBaseRef` pointer value; for the mock it
/// is a key into the mock's object table. Zero is the null reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawRef(pub usize);

impl RawRef {
    pub const NULL: Self = Self(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn from_ptr(ptr: *mut std::ffi::c_void) -> Self {
        Self(ptr as usize)
    }

    pub fn as_ptr(self) -> *mut std::ffi::c_void {
        self.0 as *mut std::ffi::c_void
    }
}

/// Object event callback: receives the event kind and the object reference,
/// returns the status code handed back to the SDK.
///
/// The callback owns one reference to `object` and must release it.
pub type ObjectEventCallback = Arc<dyn Fn(EdsObjectEvent, RawRef) -> EdsError + Send + Sync>;

/// Abstraction over EDSDK operations.
///
/// All methods take `&self`; the implementation manages interior
/// mutability (e.g. via `Mutex` for the mock's state).
pub trait EdsSdkApi: Send + Sync {
    /// `EdsInitializeSDK`.
    fn initialize(&self) -> Result<()>;

    /// `EdsTerminateSDK`.
    fn terminate(&self) -> Result<()>;

    /// Acquire the list of connected cameras.
    fn camera_list(&self) -> Result<RawRef>;

    /// Number of children of a list or container reference.
    fn child_count(&self, parent: RawRef) -> Result<u32>;

    /// Acquire the child at `index`.
    fn child_at_index(&self, parent: RawRef, index: u32) -> Result<RawRef>;

    /// Drop one reference.
    fn release(&self, object: RawRef) -> Result<()>;

    /// Get device information for a camera.
    fn device_info(&self, camera: RawRef) -> Result<EdsDeviceInfo>;

    /// Open a session with a camera.
    fn open_session(&self, camera: RawRef) -> Result<()>;

    /// Close a session with a camera.
    fn close_session(&self, camera: RawRef) -> Result<()>;

    /// Read a 4-byte property value.
    fn get_property(&self, object: RawRef, prop: EdsPropertyID) -> Result<u32>;

    /// Write a 4-byte property value.
    fn set_property(&self, object: RawRef, prop: EdsPropertyID, value: u32) -> Result<()>;

    /// Get the property description (list of allowed values).
    fn property_desc(&self, object: RawRef, prop: EdsPropertyID) -> Result<EdsPropertyDesc>;

    /// Send a camera command.
    fn send_command(&self, camera: RawRef, command: EdsCameraCommand, param: i32) -> Result<()>;

    /// Tell the camera how much room the host has for transferred images.
    fn set_capacity(&self, camera: RawRef, capacity: EdsCapacity) -> Result<()>;

    /// Get information about a storage volume.
    fn volume_info(&self, volume: RawRef) -> Result<EdsVolumeInfo>;

    /// Get information about a directory item.
    fn directory_item_info(&self, item: RawRef) -> Result<EdsDirectoryItemInfo>;

    /// Acquire a file-backed stream.
    fn create_file_stream(&self, path: &Path, disposition: u32, access: u32) -> Result<RawRef>;

    /// Copy `size` bytes of a directory item into a stream.
    fn download(&self, item: RawRef, size: u64, stream: RawRef) -> Result<()>;

    /// Acknowledge a finished download so the camera leaves its wait state.
    fn download_complete(&self, item: RawRef) -> Result<()>;

    /// Refuse a pending transfer so the camera leaves its wait state.
    fn download_cancel(&self, item: RawRef) -> Result<()>;

    /// Register (or with `None`, remove) the object event handler of a camera.
    fn set_object_event_handler(
        &self,
        camera: RawRef,
        event: EdsObjectEvent,
        handler: Option<ObjectEventCallback>,
    ) -> Result<()>;

    /// Process pending EDSDK events.
    fn get_event(&self) -> Result<()>;
}
