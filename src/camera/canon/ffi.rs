//! Raw EDSDK FFI declarations.
//!
//! These are only compiled when the `canon` feature is enabled AND the
//! EDSDK library is available for linking. All access goes through the
//! safe `EdsSdk` wrapper; never call these directly.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_void};

use super::types::{
    EdsBaseRef, EdsCameraCommand, EdsCapacity, EdsDeviceInfo, EdsDirectoryItemInfo, EdsError,
    EdsObjectEvent, EdsPropertyDescRaw, EdsPropertyID, EdsVolumeInfo,
};

/// Object event handler callback type.
pub type EdsObjectEventHandler = unsafe extern "system" fn(
    event: EdsObjectEvent,
    object: EdsBaseRef,
    context: *mut c_void,
) -> EdsError;

/// Returned by `EdsRelease` when the reference was not valid.
pub const RELEASE_FAILED: u32 = 0xFFFF_FFFF;

#[link(name = "EDSDK")]
extern "system" {
    /// Initialise the EDSDK. Must be called before any other SDK function.
    pub fn EdsInitializeSDK() -> EdsError;

    /// Shut down the EDSDK and release all resources.
    pub fn EdsTerminateSDK() -> EdsError;

    /// Get the list of connected Canon cameras.
    pub fn EdsGetCameraList(camera_list: *mut EdsBaseRef) -> EdsError;

    /// Get the number of children of a list or container.
    pub fn EdsGetChildCount(ref_: EdsBaseRef, count: *mut u32) -> EdsError;

    /// Get the child at a specific index.
    pub fn EdsGetChildAtIndex(ref_: EdsBaseRef, index: i32, child: *mut EdsBaseRef) -> EdsError;

    /// Decrement a reference count. Returns the new count.
    pub fn EdsRelease(ref_: EdsBaseRef) -> u32;

    /// Get device information for a camera.
    pub fn EdsGetDeviceInfo(camera: EdsBaseRef, info: *mut EdsDeviceInfo) -> EdsError;

    /// Open a session with a camera.
    pub fn EdsOpenSession(camera: EdsBaseRef) -> EdsError;

    /// Close a session with a camera.
    pub fn EdsCloseSession(camera: EdsBaseRef) -> EdsError;

    /// Get a property value.
    pub fn EdsGetPropertyData(
        ref_: EdsBaseRef,
        prop_id: EdsPropertyID,
        param: i32,
        size: u32,
        data: *mut c_void,
    ) -> EdsError;

    /// Set a property value.
    pub fn EdsSetPropertyData(
        ref_: EdsBaseRef,
        prop_id: EdsPropertyID,
        param: i32,
        size: u32,
        data: *const c_void,
    ) -> EdsError;

    /// Get the property description (available values) for a property.
    pub fn EdsGetPropertyDesc(
        ref_: EdsBaseRef,
        prop_id: EdsPropertyID,
        desc: *mut EdsPropertyDescRaw,
    ) -> EdsError;

    /// Send a command to a camera.
    pub fn EdsSendCommand(camera: EdsBaseRef, command: EdsCameraCommand, param: i32) -> EdsError;

    /// Tell the camera how much room the host has.
    pub fn EdsSetCapacity(camera: EdsBaseRef, capacity: EdsCapacity) -> EdsError;

    /// Get information about a storage volume.
    pub fn EdsGetVolumeInfo(volume: EdsBaseRef, info: *mut EdsVolumeInfo) -> EdsError;

    /// Get information about a directory item.
    pub fn EdsGetDirectoryItemInfo(item: EdsBaseRef, info: *mut EdsDirectoryItemInfo) -> EdsError;

    /// Create a stream backed by a file on the host.
    pub fn EdsCreateFileStream(
        file_name: *const c_char,
        disposition: u32,
        access: u32,
        stream: *mut EdsBaseRef,
    ) -> EdsError;

    /// Copy a directory item into a stream.
    pub fn EdsDownload(item: EdsBaseRef, size: u64, stream: EdsBaseRef) -> EdsError;

    /// Acknowledge a finished download.
    pub fn EdsDownloadComplete(item: EdsBaseRef) -> EdsError;

    /// Refuse a pending transfer.
    pub fn EdsDownloadCancel(item: EdsBaseRef) -> EdsError;

    /// Register an object event handler for a camera. `None` removes it.
    pub fn EdsSetObjectEventHandler(
        camera: EdsBaseRef,
        event: EdsObjectEvent,
        handler: Option<EdsObjectEventHandler>,
        context: *mut c_void,
    ) -> EdsError;

    /// Process pending EDSDK events (must be called periodically).
    pub fn EdsGetEvent() -> EdsError;
}
