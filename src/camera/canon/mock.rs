//! Mock EDSDK implementation for testing without real Canon DLLs.
//!
//! Uses a builder pattern to configure cameras, properties, volumes, the
//! image a capture produces, how its transfer event is delivered, and
//! error injection. Every reference it hands out is tracked so tests can
//! assert that acquisitions and releases balance.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::camera::error::{CameraError, Result};

use super::api::{EdsSdkApi, ObjectEventCallback, RawRef};
use super::status::{
    self, EDS_ERR_DEVICE_NOT_FOUND, EDS_ERR_FILE_OPEN_ERROR, EDS_ERR_FILE_WRITE_ERROR,
    EDS_ERR_INVALID_HANDLE, EDS_ERR_INVALID_INDEX, EDS_ERR_PROPERTIES_UNAVAILABLE,
    EDS_ERR_SESSION_NOT_OPEN,
};
use super::types::*;

/// How the mock delivers the transfer request that follows a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Delivered from inside the next `get_event` call, like a polled SDK.
    #[default]
    OnGetEvent,
    /// Delivered from a separate thread after the given delay.
    Background(Duration),
    /// Held until the test calls [`MockEdsSdk::deliver_pending`].
    Manual,
}

/// A simulated storage volume.
#[derive(Debug, Clone)]
struct MockVolume {
    label: String,
    max_capacity: u64,
    free_space: u64,
}

/// A simulated Canon camera in the mock.
#[derive(Debug, Clone)]
struct MockCamera {
    model: String,
    port: String,
    properties: HashMap<EdsPropertyID, u32>,
    property_descs: HashMap<EdsPropertyID, Vec<u32>>,
    volumes: Vec<MockVolume>,
    session_open: bool,
    capacity: Option<EdsCapacity>,
}

#[derive(Debug, Clone)]
enum MockObject {
    CameraList,
    Camera(usize),
    Volume { camera: usize, index: usize },
    DirectoryItem { file_name: String, data: Vec<u8> },
    Stream(PathBuf),
}

/// An object event waiting to be handed to a registered handler.
#[derive(Debug, Clone)]
struct PendingEvent {
    camera: usize,
    event: EdsObjectEvent,
    file_name: String,
    data: Vec<u8>,
}

/// Configurable error injection for a specific operation.
#[derive(Debug, Clone)]
struct ErrorInjection {
    operation: &'static str,
    code: EdsError,
}

#[derive(Default)]
struct MockState {
    cameras: Vec<MockCamera>,
    objects: HashMap<usize, MockObject>,
    next_id: usize,
    handlers: HashMap<usize, (EdsObjectEvent, ObjectEventCallback)>,
    pending: Vec<PendingEvent>,
    capture: Option<(String, Vec<u8>)>,
    delivery: DeliveryMode,
    error_injections: Vec<ErrorInjection>,
    commands: Vec<EdsCameraCommand>,
    handler_results: Vec<EdsError>,
    acquired: usize,
    released: usize,
    initialized: usize,
    terminated: usize,
    completed: usize,
    cancelled: usize,
    events_processed: u32,
}

/// Mock EDSDK implementation.
///
/// All state is behind a `Mutex` so the mock satisfies `Send + Sync`.
/// Handlers are always invoked with the lock released, so they may call
/// back into the mock.
pub struct MockEdsSdk {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockEdsSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEdsSdk {
    /// Create a new empty mock (no cameras).
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                next_id: 1,
                ..MockState::default()
            })),
        }
    }

    /// Add a camera with a specific model name and port.
    pub fn with_camera(self, model: &str, port: &str) -> Self {
        let mut state = self.state.lock().unwrap();
        state.cameras.push(MockCamera {
            model: model.to_string(),
            port: port.to_string(),
            properties: HashMap::new(),
            property_descs: HashMap::new(),
            volumes: Vec::new(),
            session_open: false,
            capacity: None,
        });
        drop(state);
        self
    }

    /// Add N cameras with auto-generated names and ports.
    pub fn with_cameras(self, count: usize) -> Self {
        let mut result = self;
        for i in 0..count {
            result = result.with_camera(
                &format!("Canon EOS Mock {}", i + 1),
                &format!("usb:{:03}", i + 1),
            );
        }
        result
    }

    /// Set a property value on a specific camera (by index).
    pub fn with_property(self, camera_idx: usize, prop: EdsPropertyID, value: u32) -> Self {
        let mut state = self.state.lock().unwrap();
        if let Some(cam) = state.cameras.get_mut(camera_idx) {
            cam.properties.insert(prop, value);
        }
        drop(state);
        self
    }

    /// Set the allowed values for a property on a specific camera.
    pub fn with_property_desc(self, camera_idx: usize, prop: EdsPropertyID, values: Vec<u32>) -> Self {
        let mut state = self.state.lock().unwrap();
        if let Some(cam) = state.cameras.get_mut(camera_idx) {
            cam.property_descs.insert(prop, values);
        }
        drop(state);
        self
    }

    /// Give a camera a small but realistic set of Tv/Av/ISO choices.
    ///
    /// Tv: 1/30, 1/125, 1/500. Av: f/2.8, f/5.6, f/11. ISO: Auto, 100, 200,
    /// 400, 800.
    pub fn with_exposure_values(self, camera_idx: usize) -> Self {
        self.with_property_desc(camera_idx, PROP_ID_TV, vec![0x60, 0x70, 0x80])
            .with_property_desc(camera_idx, PROP_ID_AV, vec![0x20, 0x30, 0x40])
            .with_property_desc(
                camera_idx,
                PROP_ID_ISO_SPEED,
                vec![0x00, 0x48, 0x50, 0x58, 0x60],
            )
            .with_property(camera_idx, PROP_ID_TV, 0x70)
            .with_property(camera_idx, PROP_ID_AV, 0x30)
            .with_property(camera_idx, PROP_ID_ISO_SPEED, 0x48)
            .with_property(camera_idx, PROP_ID_AF_MODE, 0)
    }

    /// Add a storage volume to a camera.
    pub fn with_volume(self, camera_idx: usize, label: &str, max_capacity: u64, free_space: u64) -> Self {
        let mut state = self.state.lock().unwrap();
        if let Some(cam) = state.cameras.get_mut(camera_idx) {
            cam.volumes.push(MockVolume {
                label: label.to_string(),
                max_capacity,
                free_space,
            });
        }
        drop(state);
        self
    }

    /// The image a `TakePicture` command produces.
    ///
    /// Without one, captures never raise a transfer request.
    pub fn with_capture(self, file_name: &str, data: Vec<u8>) -> Self {
        let mut state = self.state.lock().unwrap();
        state.capture = Some((file_name.to_string(), data));
        drop(state);
        self
    }

    pub fn with_delivery(self, delivery: DeliveryMode) -> Self {
        let mut state = self.state.lock().unwrap();
        state.delivery = delivery;
        drop(state);
        self
    }

    /// Make the next call of `operation` return the raw status `code`.
    ///
    /// Operation names match the `EdsSdkApi` method names, e.g.
    /// `"open_session"`, `"download"`, `"release"`. Each injection fires once.
    pub fn with_error(self, operation: &'static str, code: EdsError) -> Self {
        self.inject_error(operation, code);
        self
    }

    /// [`with_error`](Self::with_error) for an already-built mock.
    pub fn inject_error(&self, operation: &'static str, code: EdsError) {
        let mut state = self.state.lock().unwrap();
        state.error_injections.push(ErrorInjection { operation, code });
    }

    /// Create a directory item reference, as the SDK does for an object event.
    pub fn stage_item(&self, file_name: &str, data: Vec<u8>) -> RawRef {
        let mut state = self.state.lock().unwrap();
        state.alloc(MockObject::DirectoryItem {
            file_name: file_name.to_string(),
            data,
        })
    }

    /// Queue an arbitrary object event for a camera (by index).
    pub fn queue_object_event(&self, camera_idx: usize, event: EdsObjectEvent, file_name: &str, data: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.pending.push(PendingEvent {
            camera: camera_idx,
            event,
            file_name: file_name.to_string(),
            data,
        });
    }

    /// Deliver every queued object event now. Returns how many reached a handler.
    pub fn deliver_pending(&self) -> usize {
        deliver(&self.state)
    }

    /// References acquired so far (lists, cameras, volumes, items, streams).
    pub fn acquired(&self) -> usize {
        self.state.lock().unwrap().acquired
    }

    pub fn released(&self) -> usize {
        self.state.lock().unwrap().released
    }

    /// References acquired but not yet released.
    pub fn live_refs(&self) -> usize {
        self.state.lock().unwrap().objects.len()
    }

    pub fn initialized(&self) -> usize {
        self.state.lock().unwrap().initialized
    }

    pub fn terminated(&self) -> usize {
        self.state.lock().unwrap().terminated
    }

    /// Number of `download_complete` acknowledgements.
    pub fn completed(&self) -> usize {
        self.state.lock().unwrap().completed
    }

    /// Number of `download_cancel` calls.
    pub fn cancelled(&self) -> usize {
        self.state.lock().unwrap().cancelled
    }

    /// Return the number of `get_event` calls processed.
    pub fn events_processed(&self) -> u32 {
        self.state.lock().unwrap().events_processed
    }

    /// Commands sent to any camera, in order.
    pub fn commands(&self) -> Vec<EdsCameraCommand> {
        self.state.lock().unwrap().commands.clone()
    }

    /// Status codes returned by object event handlers, in delivery order.
    pub fn handler_results(&self) -> Vec<EdsError> {
        self.state.lock().unwrap().handler_results.clone()
    }

    /// Number of cameras with a registered object event handler.
    pub fn handler_count(&self) -> usize {
        self.state.lock().unwrap().handlers.len()
    }

    pub fn session_open(&self, camera_idx: usize) -> bool {
        self.state
            .lock()
            .unwrap()
            .cameras
            .get(camera_idx)
            .is_some_and(|c| c.session_open)
    }

    /// Current value of a camera property.
    pub fn property(&self, camera_idx: usize, prop: EdsPropertyID) -> Option<u32> {
        self.state
            .lock()
            .unwrap()
            .cameras
            .get(camera_idx)
            .and_then(|c| c.properties.get(&prop).copied())
    }

    /// The last capacity record pushed to a camera.
    pub fn capacity(&self, camera_idx: usize) -> Option<EdsCapacity> {
        self.state
            .lock()
            .unwrap()
            .cameras
            .get(camera_idx)
            .and_then(|c| c.capacity)
    }
}

impl MockState {
    /// Check for injected errors for the given operation.
    fn check_error(&mut self, operation: &str) -> Result<()> {
        if let Some(pos) = self
            .error_injections
            .iter()
            .position(|e| e.operation == operation)
        {
            let injection = self.error_injections.remove(pos);
            return status::check(injection.code);
        }
        Ok(())
    }

    fn alloc(&mut self, object: MockObject) -> RawRef {
        let id = self.next_id;
        self.next_id += 1;
        self.objects.insert(id, object);
        self.acquired += 1;
        RawRef(id)
    }

    fn object(&self, r: RawRef) -> Result<&MockObject> {
        self.objects
            .get(&r.0)
            .ok_or_else(|| fail(EDS_ERR_INVALID_HANDLE))
    }

    fn camera_index(&self, r: RawRef) -> Result<usize> {
        match self.object(r)? {
            MockObject::Camera(idx) => Ok(*idx),
            _ => Err(fail(EDS_ERR_INVALID_HANDLE)),
        }
    }

    fn camera_mut(&mut self, r: RawRef) -> Result<&mut MockCamera> {
        let idx = self.camera_index(r)?;
        self.cameras
            .get_mut(idx)
            .ok_or_else(|| fail(EDS_ERR_DEVICE_NOT_FOUND))
    }

    fn camera(&self, r: RawRef) -> Result<&MockCamera> {
        let idx = self.camera_index(r)?;
        self.cameras
            .get(idx)
            .ok_or_else(|| fail(EDS_ERR_DEVICE_NOT_FOUND))
    }
}

fn fail(code: EdsError) -> CameraError {
    status::failure(code).into()
}

/// Hand every queued event to its camera's handler, outside the lock.
fn deliver(state: &Mutex<MockState>) -> usize {
    let batch: Vec<(ObjectEventCallback, EdsObjectEvent, RawRef)> = {
        let mut st = state.lock().unwrap();
        let pending = std::mem::take(&mut st.pending);
        let mut batch = Vec::new();
        for ev in pending {
            let handler = st
                .handlers
                .get(&ev.camera)
                .filter(|(registered, _)| *registered == OBJECT_EVENT_ALL || *registered == ev.event)
                .map(|(_, h)| Arc::clone(h));
            match handler {
                Some(handler) => {
                    let item = st.alloc(MockObject::DirectoryItem {
                        file_name: ev.file_name,
                        data: ev.data,
                    });
                    batch.push((handler, ev.event, item));
                }
                None => tracing::debug!("Mock dropping object event 0x{:X}: no handler", ev.event),
            }
        }
        batch
    };

    let delivered = batch.len();
    for (handler, event, item) in batch {
        let code = handler(event, item);
        state.lock().unwrap().handler_results.push(code);
    }
    delivered
}

impl EdsSdkApi for MockEdsSdk {
    fn initialize(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("initialize")?;
        state.initialized += 1;
        Ok(())
    }

    fn terminate(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("terminate")?;
        state.terminated += 1;
        Ok(())
    }

    fn camera_list(&self) -> Result<RawRef> {
        let mut state = self.state.lock().unwrap();
        state.check_error("camera_list")?;
        Ok(state.alloc(MockObject::CameraList))
    }

    fn child_count(&self, parent: RawRef) -> Result<u32> {
        let mut state = self.state.lock().unwrap();
        state.check_error("child_count")?;
        let count = match state.object(parent)? {
            MockObject::CameraList => state.cameras.len(),
            MockObject::Camera(_) => state.camera(parent)?.volumes.len(),
            _ => 0,
        };
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn child_at_index(&self, parent: RawRef, index: u32) -> Result<RawRef> {
        let mut state = self.state.lock().unwrap();
        state.check_error("child_at_index")?;
        let index = index as usize;
        let child = match state.object(parent)? {
            MockObject::CameraList if index < state.cameras.len() => MockObject::Camera(index),
            MockObject::Camera(camera) => {
                let camera = *camera;
                if index >= state.camera(parent)?.volumes.len() {
                    return Err(fail(EDS_ERR_INVALID_INDEX));
                }
                MockObject::Volume { camera, index }
            }
            MockObject::CameraList => return Err(fail(EDS_ERR_INVALID_INDEX)),
            _ => return Err(fail(EDS_ERR_INVALID_HANDLE)),
        };
        Ok(state.alloc(child))
    }

    fn release(&self, object: RawRef) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("release")?;
        if state.objects.remove(&object.0).is_none() {
            return Err(fail(EDS_ERR_INVALID_HANDLE));
        }
        state.released += 1;
        Ok(())
    }

    fn device_info(&self, camera: RawRef) -> Result<EdsDeviceInfo> {
        let mut state = self.state.lock().unwrap();
        state.check_error("device_info")?;
        let cam = state.camera(camera)?;

        let mut info = EdsDeviceInfo::zeroed();
        write_c_string(&mut info.device_description, &cam.model);
        write_c_string(&mut info.port_name, &cam.port);
        Ok(info)
    }

    fn open_session(&self, camera: RawRef) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("open_session")?;
        state.camera_mut(camera)?.session_open = true;
        Ok(())
    }

    fn close_session(&self, camera: RawRef) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("close_session")?;
        state.camera_mut(camera)?.session_open = false;
        Ok(())
    }

    fn get_property(&self, object: RawRef, prop: EdsPropertyID) -> Result<u32> {
        let mut state = self.state.lock().unwrap();
        state.check_error("get_property")?;
        state
            .camera(object)?
            .properties
            .get(&prop)
            .copied()
            .ok_or_else(|| fail(EDS_ERR_PROPERTIES_UNAVAILABLE))
    }

    fn set_property(&self, object: RawRef, prop: EdsPropertyID, value: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("set_property")?;
        let cam = state.camera_mut(object)?;
        if !cam.session_open {
            return Err(fail(EDS_ERR_SESSION_NOT_OPEN));
        }
        cam.properties.insert(prop, value);
        Ok(())
    }

    fn property_desc(&self, object: RawRef, prop: EdsPropertyID) -> Result<EdsPropertyDesc> {
        let mut state = self.state.lock().unwrap();
        state.check_error("property_desc")?;
        let values = state
            .camera(object)?
            .property_descs
            .get(&prop)
            .cloned()
            .unwrap_or_default();
        Ok(EdsPropertyDesc { values })
    }

    fn send_command(&self, camera: RawRef, command: EdsCameraCommand, _param: i32) -> Result<()> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.check_error("send_command")?;
        let idx = state.camera_index(camera)?;
        if !state.camera(camera)?.session_open {
            return Err(fail(EDS_ERR_SESSION_NOT_OPEN));
        }
        state.commands.push(command);

        if command != CAMERA_COMMAND_TAKE_PICTURE {
            return Ok(());
        }
        let Some((file_name, data)) = state.capture.clone() else {
            return Ok(());
        };
        state.pending.push(PendingEvent {
            camera: idx,
            event: OBJECT_EVENT_DIR_ITEM_REQUEST_TRANSFER,
            file_name,
            data,
        });

        if let DeliveryMode::Background(delay) = state.delivery {
            let shared = Arc::clone(&self.state);
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                deliver(&shared);
            });
        }
        Ok(())
    }

    fn set_capacity(&self, camera: RawRef, capacity: EdsCapacity) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("set_capacity")?;
        state.camera_mut(camera)?.capacity = Some(capacity);
        Ok(())
    }

    fn volume_info(&self, volume: RawRef) -> Result<EdsVolumeInfo> {
        let mut state = self.state.lock().unwrap();
        state.check_error("volume_info")?;
        let (camera, index) = match state.object(volume)? {
            MockObject::Volume { camera, index } => (*camera, *index),
            _ => return Err(fail(EDS_ERR_INVALID_HANDLE)),
        };
        let vol = state
            .cameras
            .get(camera)
            .and_then(|c| c.volumes.get(index))
            .ok_or_else(|| fail(EDS_ERR_INVALID_INDEX))?;

        let mut info = EdsVolumeInfo::zeroed();
        info.storage_type = 2;
        info.access = ACCESS_READ_WRITE;
        info.max_capacity = vol.max_capacity;
        info.free_space_in_bytes = vol.free_space;
        write_c_string(&mut info.volume_label, &vol.label);
        Ok(info)
    }

    fn directory_item_info(&self, item: RawRef) -> Result<EdsDirectoryItemInfo> {
        let mut state = self.state.lock().unwrap();
        state.check_error("directory_item_info")?;
        match state.object(item)? {
            MockObject::DirectoryItem { file_name, data } => {
                let mut info = EdsDirectoryItemInfo::zeroed();
                info.size = data.len() as u64;
                write_c_string(&mut info.file_name, file_name);
                Ok(info)
            }
            _ => Err(fail(EDS_ERR_INVALID_HANDLE)),
        }
    }

    fn create_file_stream(&self, path: &Path, disposition: u32, _access: u32) -> Result<RawRef> {
        let mut state = self.state.lock().unwrap();
        state.check_error("create_file_stream")?;
        let created = match disposition {
            FILE_CREATE_DISPOSITION_CREATE_NEW => std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(path),
            FILE_CREATE_DISPOSITION_OPEN_EXISTING => {
                std::fs::OpenOptions::new().write(true).open(path)
            }
            _ => std::fs::File::create(path),
        };
        if created.is_err() {
            return Err(fail(EDS_ERR_FILE_OPEN_ERROR));
        }
        Ok(state.alloc(MockObject::Stream(path.to_path_buf())))
    }

    fn download(&self, item: RawRef, size: u64, stream: RawRef) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("download")?;
        let data = match state.object(item)? {
            MockObject::DirectoryItem { data, .. } => data.clone(),
            _ => return Err(fail(EDS_ERR_INVALID_HANDLE)),
        };
        let path = match state.object(stream)? {
            MockObject::Stream(path) => path.clone(),
            _ => return Err(fail(EDS_ERR_INVALID_HANDLE)),
        };
        let len = usize::try_from(size).unwrap_or(usize::MAX).min(data.len());
        std::fs::write(&path, &data[..len]).map_err(|_| fail(EDS_ERR_FILE_WRITE_ERROR))
    }

    fn download_complete(&self, item: RawRef) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("download_complete")?;
        state.object(item)?;
        state.completed += 1;
        Ok(())
    }

    fn download_cancel(&self, item: RawRef) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("download_cancel")?;
        state.object(item)?;
        state.cancelled += 1;
        Ok(())
    }

    fn set_object_event_handler(
        &self,
        camera: RawRef,
        event: EdsObjectEvent,
        handler: Option<ObjectEventCallback>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.check_error("set_object_event_handler")?;
        let idx = state.camera_index(camera)?;
        match handler {
            Some(handler) => {
                state.handlers.insert(idx, (event, handler));
            }
            None => {
                state.handlers.remove(&idx);
            }
        }
        Ok(())
    }

    fn get_event(&self) -> Result<()> {
        let delivery = {
            let mut state = self.state.lock().unwrap();
            state.check_error("get_event")?;
            state.events_processed += 1;
            state.delivery
        };
        if delivery == DeliveryMode::OnGetEvent {
            deliver(&self.state);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn open_first(mock: &MockEdsSdk) -> (RawRef, RawRef) {
        let list = mock.camera_list().unwrap();
        let camera = mock.child_at_index(list, 0).unwrap();
        mock.open_session(camera).unwrap();
        (list, camera)
    }

    #[test]
    fn empty_mock_returns_no_cameras() {
        let mock = MockEdsSdk::new();
        let list = mock.camera_list().unwrap();
        assert_eq!(mock.child_count(list).unwrap(), 0);
        assert!(mock.child_at_index(list, 0).is_err());
        mock.release(list).unwrap();
        assert_eq!(mock.live_refs(), 0);
    }

    #[test]
    fn with_cameras_returns_correct_count() {
        let mock = MockEdsSdk::new().with_cameras(3);
        let list = mock.camera_list().unwrap();
        assert_eq!(mock.child_count(list).unwrap(), 3);
    }

    #[test]
    fn with_camera_returns_device_info() {
        let mock = MockEdsSdk::new().with_camera("Canon EOS R5", "usb:042");
        let list = mock.camera_list().unwrap();
        let camera = mock.child_at_index(list, 0).unwrap();
        let info = mock.device_info(camera).unwrap();
        assert_eq!(info.model_name(), "Canon EOS R5");
        assert_eq!(info.port_name(), "usb:042");
    }

    #[test]
    fn release_tracks_balance_and_rejects_double_release() {
        let mock = MockEdsSdk::new().with_cameras(1);
        let list = mock.camera_list().unwrap();
        let camera = mock.child_at_index(list, 0).unwrap();
        assert_eq!(mock.acquired(), 2);

        mock.release(camera).unwrap();
        mock.release(list).unwrap();
        assert_eq!(mock.released(), 2);
        assert_eq!(mock.live_refs(), 0);

        let err = mock.release(list).unwrap_err();
        assert_eq!(err.sdk_code(), Some(EDS_ERR_INVALID_HANDLE));
    }

    #[test]
    fn property_read_write() {
        let mock = MockEdsSdk::new()
            .with_cameras(1)
            .with_property(0, PROP_ID_ISO_SPEED, 0x48);
        let (_, camera) = open_first(&mock);
        assert_eq!(mock.get_property(camera, PROP_ID_ISO_SPEED).unwrap(), 0x48);

        mock.set_property(camera, PROP_ID_ISO_SPEED, 0x50).unwrap();
        assert_eq!(mock.get_property(camera, PROP_ID_ISO_SPEED).unwrap(), 0x50);
        assert_eq!(mock.property(0, PROP_ID_ISO_SPEED), Some(0x50));
    }

    #[test]
    fn property_desc_returns_configured_values() {
        let mock = MockEdsSdk::new()
            .with_cameras(1)
            .with_property_desc(0, PROP_ID_ISO_SPEED, vec![0x48, 0x50, 0x58]);
        let (_, camera) = open_first(&mock);
        let desc = mock.property_desc(camera, PROP_ID_ISO_SPEED).unwrap();
        assert_eq!(desc.values, vec![0x48, 0x50, 0x58]);
    }

    #[test]
    fn error_injection_fires_once_and_is_classified() {
        let mock = MockEdsSdk::new().with_cameras(1).with_error("camera_list", 0x81);

        match mock.camera_list() {
            Err(CameraError::Sdk(f)) => assert_eq!(f.name, "EDS_ERR_DEVICE_BUSY"),
            other => panic!("expected busy, got {other:?}"),
        }
        assert!(mock.camera_list().is_ok());
    }

    #[test]
    fn capture_is_delivered_on_get_event() {
        let mock = MockEdsSdk::new()
            .with_cameras(1)
            .with_capture("IMG_0001.CR2", vec![1, 2, 3]);
        let (_, camera) = open_first(&mock);

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let handler: ObjectEventCallback = Arc::new(move |event, _item| {
            assert_eq!(event, OBJECT_EVENT_DIR_ITEM_REQUEST_TRANSFER);
            counter.fetch_add(1, Ordering::SeqCst);
            0
        });
        mock.set_object_event_handler(camera, OBJECT_EVENT_ALL, Some(handler))
            .unwrap();

        mock.send_command(camera, CAMERA_COMMAND_TAKE_PICTURE, 0)
            .unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        mock.get_event().unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(mock.handler_results(), vec![0]);
        assert_eq!(mock.events_processed(), 1);
    }

    #[test]
    fn manual_delivery_waits_for_the_test() {
        let mock = MockEdsSdk::new()
            .with_cameras(1)
            .with_capture("IMG_0001.CR2", vec![1])
            .with_delivery(DeliveryMode::Manual);
        let (_, camera) = open_first(&mock);
        let handler: ObjectEventCallback = Arc::new(|_, _| 0);
        mock.set_object_event_handler(camera, OBJECT_EVENT_ALL, Some(handler))
            .unwrap();

        mock.send_command(camera, CAMERA_COMMAND_TAKE_PICTURE, 0)
            .unwrap();
        mock.get_event().unwrap();
        assert!(mock.handler_results().is_empty());

        assert_eq!(mock.deliver_pending(), 1);
        assert_eq!(mock.handler_results(), vec![0]);
    }

    #[test]
    fn commands_require_an_open_session() {
        let mock = MockEdsSdk::new().with_cameras(1);
        let list = mock.camera_list().unwrap();
        let camera = mock.child_at_index(list, 0).unwrap();
        let err = mock
            .send_command(camera, CAMERA_COMMAND_TAKE_PICTURE, 0)
            .unwrap_err();
        assert_eq!(err.sdk_code(), Some(EDS_ERR_SESSION_NOT_OPEN));
    }

    #[test]
    fn download_writes_into_the_stream_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mock = MockEdsSdk::new();

        let item = mock.stage_item("IMG_0002.JPG", b"jpeg-bytes".to_vec());
        let info = mock.directory_item_info(item).unwrap();
        assert_eq!(info.size, 10);
        assert_eq!(info.file_name(), "IMG_0002.JPG");

        let stream = mock
            .create_file_stream(&path, FILE_CREATE_DISPOSITION_CREATE_ALWAYS, ACCESS_WRITE)
            .unwrap();
        mock.download(item, info.size, stream).unwrap();
        mock.download_complete(item).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"jpeg-bytes");
        assert_eq!(mock.completed(), 1);
    }

    #[test]
    fn volumes_are_children_of_the_camera() {
        let mock = MockEdsSdk::new()
            .with_cameras(1)
            .with_volume(0, "CF", 64_000, 32_000);
        let (_, camera) = open_first(&mock);
        assert_eq!(mock.child_count(camera).unwrap(), 1);
        let volume = mock.child_at_index(camera, 0).unwrap();
        let info = mock.volume_info(volume).unwrap();
        assert_eq!(info.label(), "CF");
        assert_eq!(info.free_space_in_bytes, 32_000);
    }

    #[test]
    fn mock_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockEdsSdk>();
    }
}
