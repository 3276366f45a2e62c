//! EDSDK status code classification.
//!
//! Every raw return code from the SDK boundary goes through [`classify`]
//! (or its `CameraError` flavour, [`check`]) before the caller proceeds.

use crate::camera::error::{Result, SdkFailure};

use super::types::EdsError;

/// Operation completed successfully.
pub const EDS_ERR_OK: EdsError = 0x00000000;
pub const EDS_ERR_INTERNAL_ERROR: EdsError = 0x00000002;
pub const EDS_ERR_FILE_OPEN_ERROR: EdsError = 0x00000023;
pub const EDS_ERR_FILE_WRITE_ERROR: EdsError = 0x00000028;
pub const EDS_ERR_PROPERTIES_UNAVAILABLE: EdsError = 0x00000050;
pub const EDS_ERR_INVALID_PARAMETER: EdsError = 0x00000060;
pub const EDS_ERR_INVALID_HANDLE: EdsError = 0x00000061;
pub const EDS_ERR_INVALID_INDEX: EdsError = 0x00000063;
pub const EDS_ERR_DEVICE_NOT_FOUND: EdsError = 0x00000080;
/// The device is busy; retry after a short delay.
pub const EDS_ERR_DEVICE_BUSY: EdsError = 0x00000081;
pub const EDS_ERR_COMM_DISCONNECTED: EdsError = 0x000000C1;
pub const EDS_ERR_SESSION_NOT_OPEN: EdsError = 0x00002003;
pub const EDS_ERR_OBJECT_NOTREADY: EdsError = 0x0000A102;
pub const EDS_ERR_TAKE_PICTURE_AF_NG: EdsError = 0x00008D01;
pub const EDS_ERR_TAKE_PICTURE_NO_CARD_NG: EdsError = 0x00008D06;

/// Symbolic name reported for codes missing from the table.
pub const UNKNOWN_NAME: &str = "EDS_ERR_UNKNOWN";
/// Message reported for codes missing from the table.
pub const UNKNOWN_MESSAGE: &str = "unknown EDSDK error";

/// One row of the status table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    pub code: EdsError,
    pub name: &'static str,
    pub message: &'static str,
}

const fn entry(code: EdsError, name: &'static str, message: &'static str) -> StatusEntry {
    StatusEntry {
        code,
        name,
        message,
    }
}

/// Known EDSDK failure codes.
pub const STATUS_TABLE: &[StatusEntry] = &[
    // Miscellaneous
    entry(0x0001, "EDS_ERR_UNIMPLEMENTED", "not implemented"),
    entry(0x0002, "EDS_ERR_INTERNAL_ERROR", "internal error"),
    entry(0x0003, "EDS_ERR_MEM_ALLOC_FAILED", "memory allocation error"),
    entry(0x0004, "EDS_ERR_MEM_FREE_FAILED", "memory release error"),
    entry(0x0005, "EDS_ERR_OPERATION_CANCELLED", "operation cancelled"),
    entry(0x0006, "EDS_ERR_INCOMPATIBLE_VERSION", "version error"),
    entry(0x0007, "EDS_ERR_NOT_SUPPORTED", "not supported"),
    entry(0x0008, "EDS_ERR_UNEXPECTED_EXCEPTION", "unexpected exception"),
    entry(0x0009, "EDS_ERR_PROTECTION_VIOLATION", "protection violation"),
    entry(0x000A, "EDS_ERR_MISSING_SUBCOMPONENT", "missing subcomponent"),
    entry(0x000B, "EDS_ERR_SELECTION_UNAVAILABLE", "selection unavailable"),
    // File access
    entry(0x0020, "EDS_ERR_FILE_IO_ERROR", "file I/O error"),
    entry(0x0021, "EDS_ERR_FILE_TOO_MANY_OPEN", "too many files open"),
    entry(0x0022, "EDS_ERR_FILE_NOT_FOUND", "file does not exist"),
    entry(0x0023, "EDS_ERR_FILE_OPEN_ERROR", "file open error"),
    entry(0x0024, "EDS_ERR_FILE_CLOSE_ERROR", "file close error"),
    entry(0x0025, "EDS_ERR_FILE_SEEK_ERROR", "file seek error"),
    entry(0x0026, "EDS_ERR_FILE_TELL_ERROR", "file tell error"),
    entry(0x0027, "EDS_ERR_FILE_READ_ERROR", "file read error"),
    entry(0x0028, "EDS_ERR_FILE_WRITE_ERROR", "file write error"),
    entry(0x0029, "EDS_ERR_FILE_PERMISSION_ERROR", "file permission error"),
    entry(0x002A, "EDS_ERR_FILE_DISK_FULL_ERROR", "disk full"),
    entry(0x002B, "EDS_ERR_FILE_ALREADY_EXISTS", "file already exists"),
    entry(0x002C, "EDS_ERR_FILE_FORMAT_UNRECOGNIZED", "file format error"),
    entry(0x002D, "EDS_ERR_FILE_DATA_CORRUPT", "invalid file data"),
    entry(0x002E, "EDS_ERR_FILE_NAMING_NA", "file naming error"),
    // Directory
    entry(0x0040, "EDS_ERR_DIR_NOT_FOUND", "directory does not exist"),
    entry(0x0041, "EDS_ERR_DIR_IO_ERROR", "directory I/O error"),
    entry(0x0042, "EDS_ERR_DIR_ENTRY_NOT_FOUND", "no file in directory"),
    entry(0x0043, "EDS_ERR_DIR_ENTRY_EXISTS", "file in directory"),
    entry(0x0044, "EDS_ERR_DIR_NOT_EMPTY", "directory full"),
    // Properties
    entry(0x0050, "EDS_ERR_PROPERTIES_UNAVAILABLE", "property unavailable"),
    entry(0x0051, "EDS_ERR_PROPERTIES_MISMATCH", "property mismatch"),
    entry(0x0053, "EDS_ERR_PROPERTIES_NOT_LOADED", "property not loaded"),
    // Function parameters
    entry(0x0060, "EDS_ERR_INVALID_PARAMETER", "invalid function parameter"),
    entry(0x0061, "EDS_ERR_INVALID_HANDLE", "handle error"),
    entry(0x0062, "EDS_ERR_INVALID_POINTER", "pointer error"),
    entry(0x0063, "EDS_ERR_INVALID_INDEX", "index error"),
    entry(0x0064, "EDS_ERR_INVALID_LENGTH", "length error"),
    entry(0x0065, "EDS_ERR_INVALID_FN_POINTER", "function pointer error"),
    entry(0x0066, "EDS_ERR_INVALID_SORT_FN", "sort function error"),
    // Device
    entry(0x0080, "EDS_ERR_DEVICE_NOT_FOUND", "device not found"),
    entry(0x0081, "EDS_ERR_DEVICE_BUSY", "device busy"),
    entry(0x0082, "EDS_ERR_DEVICE_INVALID", "device error"),
    entry(0x0083, "EDS_ERR_DEVICE_EMERGENCY", "device emergency"),
    entry(0x0084, "EDS_ERR_DEVICE_MEMORY_FULL", "device memory full"),
    entry(0x0085, "EDS_ERR_DEVICE_INTERNAL_ERROR", "internal device error"),
    entry(0x0086, "EDS_ERR_DEVICE_INVALID_PARAMETER", "device parameter invalid"),
    entry(0x0087, "EDS_ERR_DEVICE_NO_DISK", "no disk"),
    entry(0x0088, "EDS_ERR_DEVICE_DISK_ERROR", "disk error"),
    entry(0x0089, "EDS_ERR_DEVICE_CF_GATE_CHANGED", "the CF gate has been changed"),
    entry(0x008A, "EDS_ERR_DEVICE_DIAL_CHANGED", "the dial has been changed"),
    entry(0x008B, "EDS_ERR_DEVICE_NOT_INSTALLED", "device not installed"),
    entry(0x008C, "EDS_ERR_DEVICE_STAY_AWAKE", "device connected in awake mode"),
    entry(0x008D, "EDS_ERR_DEVICE_NOT_RELEASED", "device not released"),
    // Streams
    entry(0x00A0, "EDS_ERR_STREAM_IO_ERROR", "stream I/O error"),
    entry(0x00A1, "EDS_ERR_STREAM_NOT_OPEN", "stream not open"),
    entry(0x00A2, "EDS_ERR_STREAM_ALREADY_OPEN", "stream already open"),
    entry(0x00A3, "EDS_ERR_STREAM_OPEN_ERROR", "failed to open stream"),
    entry(0x00A4, "EDS_ERR_STREAM_CLOSE_ERROR", "failed to close stream"),
    entry(0x00A5, "EDS_ERR_STREAM_SEEK_ERROR", "stream seek error"),
    entry(0x00A6, "EDS_ERR_STREAM_TELL_ERROR", "stream tell error"),
    entry(0x00A7, "EDS_ERR_STREAM_READ_ERROR", "failed to read stream"),
    entry(0x00A8, "EDS_ERR_STREAM_WRITE_ERROR", "failed to write stream"),
    entry(0x00A9, "EDS_ERR_STREAM_PERMISSION_ERROR", "stream permission error"),
    entry(0x00AA, "EDS_ERR_STREAM_COULDNT_BEGIN_THREAD", "could not start reading thumbnail"),
    entry(0x00AB, "EDS_ERR_STREAM_BAD_OPTIONS", "invalid stream option"),
    entry(0x00AC, "EDS_ERR_STREAM_END_OF_STREAM", "invalid stream termination"),
    // Communication
    entry(0x00C0, "EDS_ERR_COMM_PORT_IS_IN_USE", "port in use"),
    entry(0x00C1, "EDS_ERR_COMM_DISCONNECTED", "port disconnected"),
    entry(0x00C2, "EDS_ERR_COMM_DEVICE_INCOMPATIBLE", "incompatible device"),
    entry(0x00C3, "EDS_ERR_COMM_BUFFER_FULL", "buffer full"),
    entry(0x00C4, "EDS_ERR_COMM_USB_BUS_ERR", "USB bus error"),
    // Camera UI lock
    entry(0x00D0, "EDS_ERR_USB_DEVICE_LOCK_ERROR", "failed to lock the UI"),
    entry(0x00D1, "EDS_ERR_USB_DEVICE_UNLOCK_ERROR", "failed to unlock the UI"),
    // STI/WIA
    entry(0x00E0, "EDS_ERR_STI_UNKNOWN_ERROR", "unknown STI error"),
    entry(0x00E1, "EDS_ERR_STI_INTERNAL_ERROR", "internal STI error"),
    entry(0x00E2, "EDS_ERR_STI_DEVICE_CREATE_ERROR", "device creation error"),
    entry(0x00E3, "EDS_ERR_STI_DEVICE_RELEASE_ERROR", "device release error"),
    entry(0x00E4, "EDS_ERR_DEVICE_NOT_LAUNCHED", "device startup failed"),
    // Other general errors
    entry(0x00F0, "EDS_ERR_ENUM_NA", "enumeration terminated"),
    entry(0x00F1, "EDS_ERR_INVALID_FN_CALL", "function cannot be used in this mode"),
    entry(0x00F2, "EDS_ERR_HANDLE_NOT_FOUND", "handle not found"),
    entry(0x00F3, "EDS_ERR_INVALID_ID", "invalid ID"),
    entry(0x00F4, "EDS_ERR_WAIT_TIMEOUT_ERROR", "timeout"),
    // PTP
    entry(0x2003, "EDS_ERR_SESSION_NOT_OPEN", "session not open"),
    entry(0x2004, "EDS_ERR_INVALID_TRANSACTIONID", "invalid transaction ID"),
    entry(0x2007, "EDS_ERR_INCOMPLETE_TRANSFER", "transfer problem"),
    entry(0x2008, "EDS_ERR_INVALID_STRAGEID", "storage error"),
    entry(0x200A, "EDS_ERR_DEVICEPROP_NOT_SUPPORTED", "unsupported device property"),
    entry(0x200B, "EDS_ERR_INVALID_OBJECTFORMATCODE", "invalid object format code"),
    entry(0x2011, "EDS_ERR_SELF_TEST_FAILED", "failed self-diagnosis"),
    entry(0x2012, "EDS_ERR_PARTIAL_DELETION", "failed in partial deletion"),
    entry(0x2014, "EDS_ERR_SPECIFICATION_BY_FORMAT_UNSUPPORTED", "unsupported format specification"),
    entry(0x2015, "EDS_ERR_NO_VALID_OBJECTINFO", "invalid object information"),
    entry(0x2016, "EDS_ERR_INVALID_CODE_FORMAT", "invalid code format"),
    entry(0x2017, "EDS_ERR_UNKNOWN_VENDOR_CODE", "unknown vendor code"),
    entry(0x2018, "EDS_ERR_CAPTURE_ALREADY_TERMINATED", "capture already terminated"),
    entry(0x2019, "EDS_ERR_PTP_DEVICE_BUSY", "PTP device busy"),
    entry(0x201A, "EDS_ERR_INVALID_PARENTOBJECT", "invalid parent object"),
    entry(0x201B, "EDS_ERR_INVALID_DEVICEPROP_FORMAT", "invalid property format"),
    entry(0x201C, "EDS_ERR_INVALID_DEVICEPROP_VALUE", "invalid property value"),
    entry(0x201E, "EDS_ERR_SESSION_ALREADY_OPEN", "session already open"),
    entry(0x201F, "EDS_ERR_TRANSACTION_CANCELLED", "transaction cancelled"),
    entry(0x2020, "EDS_ERR_SPECIFICATION_OF_DESTINATION_UNSUPPORTED", "unsupported destination specification"),
    entry(0x2021, "EDS_ERR_NOT_CAMERA_SUPPORT_SDK_VERSION", "camera does not support this SDK version"),
    // PTP vendor
    entry(0xA001, "EDS_ERR_UNKNOWN_COMMAND", "unknown command"),
    entry(0xA005, "EDS_ERR_OPERATION_REFUSED", "operation refused"),
    entry(0xA006, "EDS_ERR_LENS_COVER_CLOSE", "lens cover closed"),
    entry(0xA101, "EDS_ERR_LOW_BATTERY", "low battery"),
    entry(0xA102, "EDS_ERR_OBJECT_NOTREADY", "image data not ready"),
    entry(0xA104, "EDS_ERR_CANNOT_MAKE_OBJECT", "cannot make object"),
    entry(0xA106, "EDS_ERR_MEMORYSTATUS_NOTREADY", "memory status not ready"),
    // Take picture
    entry(0x8D01, "EDS_ERR_TAKE_PICTURE_AF_NG", "focus failed"),
    entry(0x8D02, "EDS_ERR_TAKE_PICTURE_RESERVED", "reserved"),
    entry(0x8D03, "EDS_ERR_TAKE_PICTURE_MIRROR_UP_NG", "currently configuring mirror up"),
    entry(0x8D04, "EDS_ERR_TAKE_PICTURE_SENSOR_CLEANING_NG", "currently cleaning sensor"),
    entry(0x8D05, "EDS_ERR_TAKE_PICTURE_SILENCE_NG", "currently performing silent operations"),
    entry(0x8D06, "EDS_ERR_TAKE_PICTURE_NO_CARD_NG", "card not installed"),
    entry(0x8D07, "EDS_ERR_TAKE_PICTURE_CARD_NG", "error writing to card"),
    entry(0x8D08, "EDS_ERR_TAKE_PICTURE_CARD_PROTECT_NG", "card write protected"),
    entry(0x8D09, "EDS_ERR_TAKE_PICTURE_MOVIE_CROP_NG", "failed in processing with movie crop"),
    entry(0x8D0A, "EDS_ERR_TAKE_PICTURE_STROBO_CHARGE_NG", "flash is charging"),
    entry(0x8D0B, "EDS_ERR_TAKE_PICTURE_NO_LENS_NG", "lens is not attached"),
    entry(0x8D0C, "EDS_ERR_TAKE_PICTURE_SPECIAL_MOVIE_MODE_NG", "movie camera exceeds the limit"),
    entry(0x8D0D, "EDS_ERR_TAKE_PICTURE_LV_REL_PROHIBIT_MODE_NG", "live view release prohibited in this AE mode"),
    entry(0x8D0E, "EDS_ERR_TAKE_PICTURE_MOVIE_MODE_NG", "cannot take a still image while preparing movie mode"),
    entry(0x8D0F, "EDS_ERR_TAKE_PICTURE_RETRUCTED_LENS_NG", "lens is retracted"),
];

/// Look up a failure code in the status table.
pub fn lookup(code: EdsError) -> Option<&'static StatusEntry> {
    STATUS_TABLE.iter().find(|e| e.code == code)
}

/// Build the failure record for a non-success code.
///
/// Unregistered codes get a generic name and message.
pub fn failure(code: EdsError) -> SdkFailure {
    match lookup(code) {
        Some(e) => SdkFailure {
            code,
            name: e.name,
            message: e.message,
        },
        None => SdkFailure {
            code,
            name: UNKNOWN_NAME,
            message: UNKNOWN_MESSAGE,
        },
    }
}

/// Classify a raw status code: `Ok(())` for `EDS_ERR_OK`, a typed failure otherwise.
pub fn classify(code: EdsError) -> std::result::Result<(), SdkFailure> {
    if code == EDS_ERR_OK {
        Ok(())
    } else {
        Err(failure(code))
    }
}

/// [`classify`], lifted into the crate-wide `Result`.
pub fn check(code: EdsError) -> Result<()> {
    classify(code).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::error::CameraError;
    use std::collections::HashSet;

    #[test]
    fn ok_classifies_as_success() {
        assert!(classify(EDS_ERR_OK).is_ok());
        assert!(check(EDS_ERR_OK).is_ok());
    }

    #[test]
    fn device_busy_has_name_and_message() {
        let failure = classify(0x0000_0081).unwrap_err();
        assert_eq!(failure.code, EDS_ERR_DEVICE_BUSY);
        assert_eq!(failure.name, "EDS_ERR_DEVICE_BUSY");
        assert!(!failure.message.is_empty());
    }

    #[test]
    fn unregistered_code_gets_generic_failure() {
        let failure = classify(0xDEAD_BEEF).unwrap_err();
        assert_eq!(failure.code, 0xDEAD_BEEF);
        assert_eq!(failure.name, UNKNOWN_NAME);
        assert_eq!(failure.message, UNKNOWN_MESSAGE);
    }

    #[test]
    fn check_wraps_failure_in_camera_error() {
        match check(EDS_ERR_TAKE_PICTURE_AF_NG) {
            Err(CameraError::Sdk(f)) => assert_eq!(f.name, "EDS_ERR_TAKE_PICTURE_AF_NG"),
            other => panic!("expected Sdk error, got {other:?}"),
        }
    }

    #[test]
    fn table_has_no_duplicate_codes_and_no_success_row() {
        let mut seen = HashSet::new();
        for e in STATUS_TABLE {
            assert_ne!(e.code, EDS_ERR_OK);
            assert!(seen.insert(e.code), "duplicate code 0x{:08X}", e.code);
            assert!(e.name.starts_with("EDS_ERR_"), "bad name {}", e.name);
            assert!(!e.message.is_empty());
        }
    }

    #[test]
    fn named_constants_are_in_the_table() {
        for code in [
            EDS_ERR_INTERNAL_ERROR,
            EDS_ERR_FILE_OPEN_ERROR,
            EDS_ERR_FILE_WRITE_ERROR,
            EDS_ERR_PROPERTIES_UNAVAILABLE,
            EDS_ERR_INVALID_PARAMETER,
            EDS_ERR_INVALID_HANDLE,
            EDS_ERR_INVALID_INDEX,
            EDS_ERR_DEVICE_NOT_FOUND,
            EDS_ERR_COMM_DISCONNECTED,
            EDS_ERR_SESSION_NOT_OPEN,
            EDS_ERR_OBJECT_NOTREADY,
            EDS_ERR_TAKE_PICTURE_NO_CARD_NG,
        ] {
            assert!(lookup(code).is_some(), "0x{code:08X} missing");
        }
    }
}
