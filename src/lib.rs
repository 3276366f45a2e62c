//! Host-side control of Canon EOS cameras over EDSDK.
//!
//! Open a [`Camera`] through an [`SdkRuntime`], adjust exposure by
//! physical value, and [`shoot`](Camera::shoot) straight to a file on the
//! host. Build with the `canon` feature to link the vendor library; without
//! it the crate runs against [`MockEdsSdk`](camera::canon::mock::MockEdsSdk).

pub mod camera;
pub mod settings;

pub use camera::canon::discovery::{list_cameras, CameraSummary, DeviceInfo, VolumeInfo};
pub use camera::canon::runtime::{SdkLease, SdkRuntime};
#[cfg(feature = "canon")]
pub use camera::canon::sdk::EdsSdk;
pub use camera::canon::session::{Camera, IsoSetting};
pub use camera::canon::transfer::TransferReceipt;
pub use camera::canon::values::{DiscreteValue, ImageQuality, Quantity, Semantic};
pub use camera::error::{CameraError, Result, SdkFailure};
pub use settings::store::SettingsStore;
pub use settings::types::CameraConfig;
