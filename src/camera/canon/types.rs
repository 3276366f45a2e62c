//! EDSDK C type definitions, property IDs, and command constants.
//!
//! Values sourced from the Canon EDSDK C header files (EDSDK.h, EDSDKTypes.h).
//! Struct layouts mirror the C declarations field for field.

/// EDSDK error code type.
pub type EdsError = u32;

/// Opaque handle to an EDSDK base reference.
pub type EdsBaseRef = *mut std::ffi::c_void;

/// EDSDK property ID type.
pub type EdsPropertyID = u32;

/// EDSDK camera command type.
pub type EdsCameraCommand = u32;

/// EDSDK object event type.
pub type EdsObjectEvent = u32;

/// Device information returned by `EdsGetDeviceInfo`.
#[derive(Debug, Clone)]
#[repr(C)]
pub struct EdsDeviceInfo {
    /// Port name (null-terminated).
    pub port_name: [u8; 256],
    /// Model name (null-terminated).
    pub device_description: [u8; 256],
    pub device_sub_type: u32,
    pub reserved: u32,
}

impl EdsDeviceInfo {
    /// An all-zero record, ready to be filled by the SDK.
    pub fn zeroed() -> Self {
        Self {
            port_name: [0u8; 256],
            device_description: [0u8; 256],
            device_sub_type: 0,
            reserved: 0,
        }
    }

    /// Extract the model name as a Rust string.
    pub fn model_name(&self) -> String {
        read_c_string(&self.device_description)
    }

    /// Extract the port name as a Rust string.
    pub fn port_name(&self) -> String {
        read_c_string(&self.port_name)
    }
}

/// Storage volume information returned by `EdsGetVolumeInfo`.
#[derive(Debug, Clone)]
#[repr(C)]
pub struct EdsVolumeInfo {
    pub storage_type: u32,
    pub access: u32,
    pub max_capacity: u64,
    pub free_space_in_bytes: u64,
    pub volume_label: [u8; 256],
}

impl EdsVolumeInfo {
    pub fn zeroed() -> Self {
        Self {
            storage_type: 0,
            access: 0,
            max_capacity: 0,
            free_space_in_bytes: 0,
            volume_label: [0u8; 256],
        }
    }

    /// Extract the volume label as a Rust string.
    pub fn label(&self) -> String {
        read_c_string(&self.volume_label)
    }
}

/// Directory item information returned by `EdsGetDirectoryItemInfo`.
#[derive(Debug, Clone)]
#[repr(C)]
pub struct EdsDirectoryItemInfo {
    /// Object size in bytes.
    pub size: u64,
    pub is_folder: i32,
    pub group_id: u32,
    pub option: u32,
    /// File name on the camera (null-terminated).
    pub file_name: [u8; 256],
    pub format: u32,
    pub date_time: u32,
}

impl EdsDirectoryItemInfo {
    pub fn zeroed() -> Self {
        Self {
            size: 0,
            is_folder: 0,
            group_id: 0,
            option: 0,
            file_name: [0u8; 256],
            format: 0,
            date_time: 0,
        }
    }

    /// Extract the camera-side file name as a Rust string.
    pub fn file_name(&self) -> String {
        read_c_string(&self.file_name)
    }
}

/// Raw property description as laid out by `EdsGetPropertyDesc`.
#[derive(Debug, Clone)]
#[repr(C)]
pub struct EdsPropertyDescRaw {
    pub form: i32,
    pub access: i32,
    pub num_elements: i32,
    pub prop_desc: [i32; 128],
}

impl EdsPropertyDescRaw {
    pub fn zeroed() -> Self {
        Self {
            form: 0,
            access: 0,
            num_elements: 0,
            prop_desc: [0; 128],
        }
    }
}

/// Property description: the values a property may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdsPropertyDesc {
    /// Available device codes, in the order the camera reports them.
    pub values: Vec<u32>,
}

impl From<&EdsPropertyDescRaw> for EdsPropertyDesc {
    fn from(raw: &EdsPropertyDescRaw) -> Self {
        let count = usize::try_from(raw.num_elements)
            .unwrap_or(0)
            .min(raw.prop_desc.len());
        Self {
            // Codes are 32-bit patterns; 0xFFFFFFFF arrives as -1.
            values: raw.prop_desc[..count].iter().map(|&v| v as u32).collect(),
        }
    }
}

/// Host capacity record sent with `EdsSetCapacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct EdsCapacity {
    pub number_of_free_clusters: i32,
    pub bytes_per_sector: i32,
    pub reset: i32,
}

impl EdsCapacity {
    /// Tells the camera the host has plenty of room for transferred images.
    pub const AMPLE: Self = Self {
        number_of_free_clusters: 0x7FFF_FFFF,
        bytes_per_sector: 512,
        reset: 1,
    };
}

// --- Property IDs ---

/// Destination of captured images.
pub const PROP_ID_SAVE_TO: EdsPropertyID = 0x0000000B;
/// Image quality (size, format and compression).
pub const PROP_ID_IMAGE_QUALITY: EdsPropertyID = 0x00000100;
/// ISO speed property.
pub const PROP_ID_ISO_SPEED: EdsPropertyID = 0x00000402;
/// Autofocus mode property.
pub const PROP_ID_AF_MODE: EdsPropertyID = 0x00000404;
/// Aperture (Av) property.
pub const PROP_ID_AV: EdsPropertyID = 0x00000405;
/// Shutter speed (Tv) property.
pub const PROP_ID_TV: EdsPropertyID = 0x00000406;

// --- Save-to value ---

pub const SAVE_TO_HOST: u32 = 2;

// --- Camera commands ---

/// Take a picture.
pub const CAMERA_COMMAND_TAKE_PICTURE: EdsCameraCommand = 0x00000000;

// --- Object events ---

/// Notifies all object events.
pub const OBJECT_EVENT_ALL: EdsObjectEvent = 0x00000200;
/// A directory item is waiting on the camera for transfer to the host.
///
/// The host must answer with either `EdsDownload` + `EdsDownloadComplete`
/// or `EdsDownloadCancel`.
pub const OBJECT_EVENT_DIR_ITEM_REQUEST_TRANSFER: EdsObjectEvent = 0x00000208;

// --- File streams ---

pub const FILE_CREATE_DISPOSITION_CREATE_NEW: u32 = 0;
pub const FILE_CREATE_DISPOSITION_CREATE_ALWAYS: u32 = 1;
pub const FILE_CREATE_DISPOSITION_OPEN_EXISTING: u32 = 2;

pub const ACCESS_WRITE: u32 = 1;
pub const ACCESS_READ_WRITE: u32 = 2;

/// Read a null-terminated C string from a byte buffer.
pub(crate) fn read_c_string(buf: &[u8]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Copy a string into a fixed-size C buffer, truncating and null-terminating.
pub(crate) fn write_c_string(buf: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    let len = bytes.len().min(buf.len().saturating_sub(1));
    buf[..len].copy_from_slice(&bytes[..len]);
    buf[len..].fill(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_ids_have_correct_values() {
        assert_eq!(PROP_ID_SAVE_TO, 0x0B);
        assert_eq!(PROP_ID_IMAGE_QUALITY, 0x100);
        assert_eq!(PROP_ID_ISO_SPEED, 0x402);
        assert_eq!(PROP_ID_AF_MODE, 0x404);
        assert_eq!(PROP_ID_AV, 0x405);
        assert_eq!(PROP_ID_TV, 0x406);
    }

    #[test]
    fn struct_layouts_match_the_c_headers() {
        assert_eq!(std::mem::size_of::<EdsDeviceInfo>(), 520);
        assert_eq!(std::mem::size_of::<EdsVolumeInfo>(), 280);
        assert_eq!(std::mem::size_of::<EdsDirectoryItemInfo>(), 288);
        assert_eq!(std::mem::size_of::<EdsPropertyDescRaw>(), 524);
        assert_eq!(std::mem::size_of::<EdsCapacity>(), 12);
    }

    #[test]
    fn device_info_reads_c_strings() {
        let mut info = EdsDeviceInfo::zeroed();
        write_c_string(&mut info.device_description, "Canon EOS R5");
        write_c_string(&mut info.port_name, "WIA:usb#1");

        assert_eq!(info.model_name(), "Canon EOS R5");
        assert_eq!(info.port_name(), "WIA:usb#1");
    }

    #[test]
    fn property_desc_keeps_only_reported_elements() {
        let mut raw = EdsPropertyDescRaw::zeroed();
        raw.num_elements = 3;
        raw.prop_desc[0] = 0x48;
        raw.prop_desc[1] = 0x50;
        raw.prop_desc[2] = -1;
        raw.prop_desc[3] = 0x58;

        let desc = EdsPropertyDesc::from(&raw);
        assert_eq!(desc.values, vec![0x48, 0x50, 0xFFFF_FFFF]);
    }

    #[test]
    fn property_desc_clamps_bogus_counts() {
        let mut raw = EdsPropertyDescRaw::zeroed();
        raw.num_elements = -4;
        assert!(EdsPropertyDesc::from(&raw).values.is_empty());

        raw.num_elements = 1000;
        assert_eq!(EdsPropertyDesc::from(&raw).values.len(), 128);
    }

    #[test]
    fn read_c_string_handles_empty_buffer() {
        let buf = [0u8; 10];
        assert_eq!(read_c_string(&buf), "");
    }

    #[test]
    fn read_c_string_handles_no_null_terminator() {
        let buf = [b'A', b'B', b'C'];
        assert_eq!(read_c_string(&buf), "ABC");
    }

    #[test]
    fn write_c_string_truncates_and_terminates() {
        let mut buf = [0xAAu8; 4];
        write_c_string(&mut buf, "ABCDEF");
        assert_eq!(buf, [b'A', b'B', b'C', 0]);
    }

    #[test]
    fn ample_capacity_matches_host_defaults() {
        assert_eq!(EdsCapacity::AMPLE.number_of_free_clusters, 0x7FFF_FFFF);
        assert_eq!(EdsCapacity::AMPLE.bytes_per_sector, 512);
        assert_eq!(EdsCapacity::AMPLE.reset, 1);
    }
}
