//! `Camera<S>`: an open EDSDK session with one camera body.
//!
//! Generic over `S: EdsSdkApi` so tests use `MockEdsSdk` while
//! production uses the real `EdsSdk` wrapper.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::camera::error::{CameraError, Result};
use crate::settings::types::CameraConfig;

use super::api::{EdsSdkApi, ObjectEventCallback, RawRef};
use super::discovery::{DeviceInfo, VolumeInfo};
use super::handle::{merge_cleanup, Handle, HandleKind};
use super::pump::{default_pump, wait_for_signal, NotificationPump};
use super::runtime::{SdkLease, SdkRuntime};
use super::transfer::{handle_object_event, TransferReceipt, TransferSlot};
use super::types::*;
use super::values::{self, DiscreteValue, ImageQuality, Quantity, Semantic, ISO_AUTO_CODE};

/// Target for [`Camera::set_iso`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IsoSetting {
    /// Let the camera choose.
    Auto,
    /// The listed sensitivity closest to this one.
    Value(f64),
}

struct OpenSession<S: EdsSdkApi> {
    camera: Handle<S>,
    handler_registered: bool,
}

/// An open camera.
///
/// The session closes on [`close`](Self::close) or on drop, whichever
/// comes first.
pub struct Camera<S: EdsSdkApi + 'static> {
    runtime: Arc<SdkRuntime<S>>,
    lease: Mutex<Option<SdkLease<S>>>,
    index: u32,
    session: Mutex<Option<OpenSession<S>>>,
    shutter_speeds: Vec<&'static DiscreteValue>,
    apertures: Vec<&'static DiscreteValue>,
    isos: Vec<&'static DiscreteValue>,
    slot: Arc<TransferSlot>,
    pump: Box<dyn NotificationPump>,
    config: CameraConfig,
    output_path: Mutex<PathBuf>,
}

impl<S: EdsSdkApi + 'static> Camera<S> {
    /// Open the `index`-th connected camera with the platform's default pump.
    pub fn open(runtime: &Arc<SdkRuntime<S>>, index: u32, config: CameraConfig) -> Result<Self> {
        let pump = default_pump(runtime.sdk());
        Self::open_with_pump(runtime, index, config, pump)
    }

    /// Open the `index`-th connected camera.
    ///
    /// On success the camera saves to the host, knows the host has room,
    /// sends transfer requests to this session, and has shutter speed,
    /// aperture and ISO set to the last usable value it lists.
    pub fn open_with_pump(
        runtime: &Arc<SdkRuntime<S>>,
        index: u32,
        config: CameraConfig,
        pump: Box<dyn NotificationPump>,
    ) -> Result<Self> {
        let lease = runtime.acquire()?;
        let sdk = Arc::clone(runtime.sdk());

        let camera = {
            let list = Handle::acquire(&sdk, HandleKind::CameraList, |s| s.camera_list())?;
            let count = sdk.child_count(list.raw())?;
            if index >= count {
                return Err(CameraError::IndexOutOfRange { index, count });
            }
            let camera = Handle::acquire(&sdk, HandleKind::Camera, |s| {
                s.child_at_index(list.raw(), index)
            })?;
            list.release()?;
            camera
        };

        sdk.open_session(camera.raw())?;
        tracing::info!("Opened session with camera {index}");

        let output_path = config.default_output.clone();
        let mut this = Self {
            runtime: Arc::clone(runtime),
            lease: Mutex::new(Some(lease)),
            index,
            session: Mutex::new(Some(OpenSession {
                camera,
                handler_registered: false,
            })),
            shutter_speeds: Vec::new(),
            apertures: Vec::new(),
            isos: Vec::new(),
            slot: Arc::new(TransferSlot::new()),
            pump,
            config,
            output_path: Mutex::new(output_path),
        };

        // Dropping `this` on failure closes the session again.
        this.configure()?;
        Ok(this)
    }

    fn configure(&mut self) -> Result<()> {
        let sdk = Arc::clone(self.runtime.sdk());
        let slot = Arc::clone(&self.slot);

        let session = self
            .session
            .get_mut()
            .as_mut()
            .ok_or(CameraError::SessionClosed)?;
        let camera = session.camera.raw();

        sdk.set_property(camera, PROP_ID_SAVE_TO, SAVE_TO_HOST)?;
        sdk.set_capacity(camera, EdsCapacity::AMPLE)?;

        let handler_sdk = Arc::clone(&sdk);
        let handler: ObjectEventCallback = Arc::new(move |event, object| {
            handle_object_event(&handler_sdk, &slot, event, object)
        });
        sdk.set_object_event_handler(camera, OBJECT_EVENT_DIR_ITEM_REQUEST_TRANSFER, Some(handler))?;
        session.handler_registered = true;

        self.shutter_speeds = read_available(&*sdk, camera, Quantity::ShutterSpeed)?;
        self.apertures = read_available(&*sdk, camera, Quantity::Aperture)?;
        self.isos = read_available(&*sdk, camera, Quantity::Iso)?;

        for (quantity, list) in [
            (Quantity::ShutterSpeed, &self.shutter_speeds),
            (Quantity::Aperture, &self.apertures),
            (Quantity::Iso, &self.isos),
        ] {
            let entry = list
                .iter()
                .rev()
                .find(|e| e.value.is_some())
                .ok_or(CameraError::NoAvailableValues(quantity))?;
            sdk.set_property(camera, quantity.property_id(), entry.code)?;
            tracing::debug!("Initial {quantity}: {}", entry.label);
        }

        sdk.set_property(camera, PROP_ID_IMAGE_QUALITY, self.config.image_quality.code())?;
        Ok(())
    }

    /// Run `f` against the open camera reference.
    fn with_camera<T>(&self, f: impl FnOnce(&Arc<S>, RawRef) -> Result<T>) -> Result<T> {
        let session = self.session.lock();
        let session = session.as_ref().ok_or(CameraError::SessionClosed)?;
        f(self.runtime.sdk(), session.camera.raw())
    }

    fn read_code(&self, prop: EdsPropertyID) -> Result<u32> {
        self.with_camera(|sdk, camera| sdk.get_property(camera, prop))
    }

    fn write_code(&self, prop: EdsPropertyID, code: u32) -> Result<()> {
        self.with_camera(|sdk, camera| sdk.set_property(camera, prop, code))
    }

    fn read(&self, quantity: Quantity) -> Result<Semantic> {
        let code = self.read_code(quantity.property_id())?;
        Ok(values::to_semantic(quantity, code))
    }

    fn write_nearest(
        &self,
        quantity: Quantity,
        target: f64,
        available: &[&'static DiscreteValue],
    ) -> Result<&'static DiscreteValue> {
        let entry = values::resolve(quantity, target, available)?;
        self.write_code(quantity.property_id(), entry.code)?;
        tracing::debug!("Set {quantity} to {} for target {target}", entry.label);
        Ok(entry)
    }

    /// Close the session and release the camera. Safe to call repeatedly.
    pub fn close(&self) -> Result<()> {
        let Some(session) = self.session.lock().take() else {
            return Ok(());
        };
        self.slot.disarm();

        let sdk = self.runtime.sdk();
        let camera = session.camera.raw();
        let mut cleanups = Vec::new();
        if session.handler_registered {
            cleanups.push(sdk.set_object_event_handler(
                camera,
                OBJECT_EVENT_DIR_ITEM_REQUEST_TRANSFER,
                None,
            ));
        }
        let closed = sdk.close_session(camera);
        cleanups.push(session.camera.release());
        drop(self.lease.lock().take());

        tracing::info!("Closed session with camera {}", self.index);
        merge_cleanup(closed, cleanups)
    }

    pub fn is_open(&self) -> bool {
        self.session.lock().is_some()
    }

    /// Position of this camera in the list it was opened from.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn device_info(&self) -> Result<DeviceInfo> {
        self.with_camera(|sdk, camera| Ok(DeviceInfo::from(&sdk.device_info(camera)?)))
    }

    /// Storage volumes (memory cards) in the camera.
    pub fn volumes(&self) -> Result<Vec<VolumeInfo>> {
        self.with_camera(|sdk, camera| {
            let count = sdk.child_count(camera)?;
            let mut volumes = Vec::with_capacity(count as usize);
            for index in 0..count {
                let volume =
                    Handle::acquire(sdk, HandleKind::Volume, |s| s.child_at_index(camera, index))?;
                let info = sdk.volume_info(volume.raw());
                let released = volume.release();
                volumes.push(VolumeInfo::from(&merge_cleanup(info, vec![released])?));
            }
            Ok(volumes)
        })
    }

    pub fn available_shutter_speeds(&self) -> &[&'static DiscreteValue] {
        &self.shutter_speeds
    }

    pub fn available_apertures(&self) -> &[&'static DiscreteValue] {
        &self.apertures
    }

    pub fn available_isos(&self) -> &[&'static DiscreteValue] {
        &self.isos
    }

    pub fn shutter_speed(&self) -> Result<Semantic> {
        self.read(Quantity::ShutterSpeed)
    }

    /// Set the listed shutter speed closest to `seconds`. Returns what was set.
    pub fn set_shutter_speed(&self, seconds: f64) -> Result<&'static DiscreteValue> {
        self.write_nearest(Quantity::ShutterSpeed, seconds, &self.shutter_speeds)
    }

    pub fn aperture(&self) -> Result<Semantic> {
        self.read(Quantity::Aperture)
    }

    /// Set the listed aperture closest to `f_number`. Returns what was set.
    pub fn set_aperture(&self, f_number: f64) -> Result<&'static DiscreteValue> {
        self.write_nearest(Quantity::Aperture, f_number, &self.apertures)
    }

    pub fn iso(&self) -> Result<Semantic> {
        self.read(Quantity::Iso)
    }

    /// Set ISO. `Auto` is written directly, never through nearest-match.
    pub fn set_iso(&self, setting: IsoSetting) -> Result<&'static DiscreteValue> {
        match setting {
            IsoSetting::Value(iso) => self.write_nearest(Quantity::Iso, iso, &self.isos),
            IsoSetting::Auto => {
                let auto = self
                    .isos
                    .iter()
                    .copied()
                    .find(|e| e.code == ISO_AUTO_CODE)
                    .ok_or(CameraError::UnsupportedValue {
                        quantity: Quantity::Iso,
                        label: "Auto",
                    })?;
                self.write_code(PROP_ID_ISO_SPEED, auto.code)?;
                tracing::debug!("Set ISO to Auto");
                Ok(auto)
            }
        }
    }

    pub fn af_mode(&self) -> Result<Semantic> {
        self.read(Quantity::AfMode)
    }

    /// Current image quality, or `None` for a combination not covered by [`ImageQuality`].
    pub fn image_quality(&self) -> Result<Option<ImageQuality>> {
        Ok(ImageQuality::from_code(self.read_code(PROP_ID_IMAGE_QUALITY)?))
    }

    pub fn set_image_quality(&self, quality: ImageQuality) -> Result<()> {
        self.write_code(PROP_ID_IMAGE_QUALITY, quality.code())
    }

    /// Where the next [`capture`](Self::capture) writes.
    pub fn output_path(&self) -> PathBuf {
        self.output_path.lock().clone()
    }

    pub fn set_output_path(&self, path: impl Into<PathBuf>) {
        *self.output_path.lock() = path.into();
    }

    /// Set the output path, then [`capture`](Self::capture).
    pub fn shoot(&self, path: impl AsRef<Path>) -> Result<TransferReceipt> {
        self.set_output_path(path.as_ref());
        self.capture()
    }

    /// Take a picture and wait until it has been downloaded to the output path.
    ///
    /// Fails with `Timeout` if the camera never asks to transfer the image,
    /// which is what a refused shot (busy, no card, no focus) looks like.
    pub fn capture(&self) -> Result<TransferReceipt> {
        let path = self.output_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        self.slot.arm(path.clone())?;
        let sent = self.with_camera(|sdk, camera| {
            sdk.send_command(camera, CAMERA_COMMAND_TAKE_PICTURE, 0)
        });
        if let Err(e) = sent {
            self.slot.disarm();
            return Err(e);
        }
        tracing::debug!("Shutter released, waiting for {}", path.display());

        let receipt = wait_for_signal(
            &self.slot,
            self.pump.as_ref(),
            self.config.capture_timeout(),
            self.config.pump_interval(),
        )?;
        tracing::info!("Captured {}", receipt.path.display());
        Ok(receipt)
    }
}

impl<S: EdsSdkApi + 'static> Drop for Camera<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("Failed to close camera {}: {e}", self.index);
        }
    }
}

fn read_available<S: EdsSdkApi>(
    sdk: &S,
    camera: RawRef,
    quantity: Quantity,
) -> Result<Vec<&'static DiscreteValue>> {
    let desc = sdk.property_desc(camera, quantity.property_id())?;
    let list = values::available(quantity, &desc.values);
    if list.is_empty() {
        return Err(CameraError::NoAvailableValues(quantity));
    }
    Ok(list)
}
