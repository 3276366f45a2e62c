//! Canon camera enumeration via EDSDK.
//!
//! Walks the SDK's camera list and reports what is attached. Every
//! reference taken along the way is released before returning.

use std::sync::Arc;

use serde::Serialize;

use crate::camera::error::Result;

use super::api::EdsSdkApi;
use super::handle::{Handle, HandleKind};
use super::runtime::SdkRuntime;
use super::types::{EdsDeviceInfo, EdsVolumeInfo};

/// Model and port of an attached body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub model: String,
    pub port: String,
}

impl From<&EdsDeviceInfo> for DeviceInfo {
    fn from(info: &EdsDeviceInfo) -> Self {
        Self {
            model: info.model_name(),
            port: info.port_name(),
        }
    }
}

/// One entry of [`list_cameras`]. `index` is what `Camera::open` takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraSummary {
    pub index: u32,
    pub model: String,
    pub port: String,
}

/// A storage volume in the camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeInfo {
    pub label: String,
    pub storage_type: u32,
    pub access: u32,
    pub max_capacity: u64,
    pub free_space: u64,
}

impl From<&EdsVolumeInfo> for VolumeInfo {
    fn from(info: &EdsVolumeInfo) -> Self {
        Self {
            label: info.label(),
            storage_type: info.storage_type,
            access: info.access,
            max_capacity: info.max_capacity,
            free_space: info.free_space_in_bytes,
        }
    }
}

/// List every connected Canon camera.
///
/// A body whose device info cannot be read is skipped with a warning.
pub fn list_cameras<S: EdsSdkApi>(runtime: &Arc<SdkRuntime<S>>) -> Result<Vec<CameraSummary>> {
    let lease = runtime.acquire()?;
    let sdk = lease.sdk();

    let list = Handle::acquire(sdk, HandleKind::CameraList, |s| s.camera_list())?;
    let count = sdk.child_count(list.raw())?;
    let mut cameras = Vec::with_capacity(count as usize);

    for index in 0..count {
        let camera = Handle::acquire(sdk, HandleKind::Camera, |s| {
            s.child_at_index(list.raw(), index)
        })?;
        match sdk.device_info(camera.raw()) {
            Ok(info) => {
                let info = DeviceInfo::from(&info);
                cameras.push(CameraSummary {
                    index,
                    model: info.model,
                    port: info.port,
                });
            }
            Err(e) => tracing::warn!("Failed to get device info for Canon camera {index}: {e}"),
        }
        camera.release()?;
    }

    list.release()?;
    tracing::debug!("Found {} Canon camera(s)", cameras.len());
    Ok(cameras)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::canon::mock::MockEdsSdk;
    use crate::camera::canon::status::{EDS_ERR_COMM_DISCONNECTED, EDS_ERR_DEVICE_BUSY};

    #[test]
    fn discovers_zero_cameras() {
        let runtime = SdkRuntime::new(MockEdsSdk::new());
        let result = list_cameras(&runtime).unwrap();
        assert!(result.is_empty());
        assert_eq!(runtime.sdk().live_refs(), 0);
    }

    #[test]
    fn discovers_multiple_cameras_in_index_order() {
        let mock = MockEdsSdk::new()
            .with_camera("Canon EOS R5", "usb:001")
            .with_camera("Canon EOS 5D Mark IV", "usb:002");
        let runtime = SdkRuntime::new(mock);

        let result = list_cameras(&runtime).unwrap();
        assert_eq!(
            result,
            vec![
                CameraSummary {
                    index: 0,
                    model: "Canon EOS R5".to_string(),
                    port: "usb:001".to_string(),
                },
                CameraSummary {
                    index: 1,
                    model: "Canon EOS 5D Mark IV".to_string(),
                    port: "usb:002".to_string(),
                },
            ]
        );
    }

    #[test]
    fn releases_every_reference_and_the_sdk() {
        let runtime = SdkRuntime::new(MockEdsSdk::new().with_cameras(3));
        list_cameras(&runtime).unwrap();

        let sdk = runtime.sdk();
        assert_eq!(sdk.acquired(), 4);
        assert_eq!(sdk.released(), 4);
        assert_eq!(sdk.initialized(), 1);
        assert_eq!(sdk.terminated(), 1);
    }

    #[test]
    fn unreadable_camera_is_skipped() {
        let mock = MockEdsSdk::new()
            .with_cameras(2)
            .with_error("device_info", EDS_ERR_COMM_DISCONNECTED);
        let runtime = SdkRuntime::new(mock);

        let result = list_cameras(&runtime).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].index, 1);
        assert_eq!(runtime.sdk().live_refs(), 0);
    }

    #[test]
    fn list_failure_propagates_and_terminates() {
        let runtime = SdkRuntime::new(MockEdsSdk::new().with_error("camera_list", EDS_ERR_DEVICE_BUSY));
        let err = list_cameras(&runtime).unwrap_err();
        assert_eq!(err.sdk_code(), Some(EDS_ERR_DEVICE_BUSY));
        assert_eq!(runtime.users(), 0);
        assert_eq!(runtime.sdk().terminated(), 1);
    }

    #[test]
    fn summary_serialises_for_frontends() {
        let summary = CameraSummary {
            index: 0,
            model: "Canon EOS R6".to_string(),
            port: "usb:001".to_string(),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["model"], "Canon EOS R6");
        assert_eq!(json["index"], 0);
    }
}
