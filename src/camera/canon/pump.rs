//! Servicing the SDK's notification channel while a capture waits.
//!
//! EDSDK delivers object events only while the host pumps: on Windows by
//! dispatching the thread's message queue, everywhere by calling
//! `EdsGetEvent`. [`wait_for_signal`] alternates between pumping and a
//! short wait on the transfer slot until the download finishes or the
//! deadline passes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::camera::error::{CameraError, Result};

use super::api::EdsSdkApi;
use super::transfer::{TransferReceipt, TransferSlot};

/// Something that delivers pending SDK notifications on the calling thread.
pub trait NotificationPump: Send + Sync {
    fn pump_pending(&self) -> Result<()>;
}

/// Polls the SDK with `EdsGetEvent`.
pub struct SdkEventPump<S: EdsSdkApi> {
    sdk: Arc<S>,
}

impl<S: EdsSdkApi> SdkEventPump<S> {
    pub fn new(sdk: Arc<S>) -> Self {
        Self { sdk }
    }
}

impl<S: EdsSdkApi> NotificationPump for SdkEventPump<S> {
    fn pump_pending(&self) -> Result<()> {
        self.sdk.get_event()
    }
}

/// Drains the calling thread's Win32 message queue.
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageQueuePump;

#[cfg(windows)]
impl NotificationPump for MessageQueuePump {
    fn pump_pending(&self) -> Result<()> {
        use windows::Win32::UI::WindowsAndMessaging::{
            DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE,
        };

        let mut msg = MSG::default();
        // SAFETY: `msg` is a valid out-parameter for the duration of each call,
        // and messages are dispatched on the thread that received them.
        unsafe {
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        Ok(())
    }
}

/// Runs both pumps, in order.
impl<A: NotificationPump, B: NotificationPump> NotificationPump for (A, B) {
    fn pump_pending(&self) -> Result<()> {
        self.0.pump_pending()?;
        self.1.pump_pending()
    }
}

/// The pump a camera session uses unless told otherwise.
#[cfg(windows)]
pub fn default_pump<S: EdsSdkApi + 'static>(sdk: &Arc<S>) -> Box<dyn NotificationPump> {
    Box::new((MessageQueuePump, SdkEventPump::new(Arc::clone(sdk))))
}

/// The pump a camera session uses unless told otherwise.
#[cfg(not(windows))]
pub fn default_pump<S: EdsSdkApi + 'static>(sdk: &Arc<S>) -> Box<dyn NotificationPump> {
    Box::new(SdkEventPump::new(Arc::clone(sdk)))
}

/// Pump until the slot reports a finished transfer or `timeout` elapses.
///
/// `tick` bounds how long each wait on the slot lasts between pumps.
/// If the wait gives up the slot is disarmed, so a transfer request that
/// arrives later is cancelled rather than written.
pub fn wait_for_signal(
    slot: &TransferSlot,
    pump: &dyn NotificationPump,
    timeout: Duration,
    tick: Duration,
) -> Result<TransferReceipt> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Err(e) = pump.pump_pending() {
            slot.disarm();
            return Err(e);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Some(result) = slot.wait(tick.min(remaining)) {
            return result;
        }
        if remaining.is_zero() {
            slot.disarm();
            return Err(CameraError::Timeout(timeout));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::canon::mock::MockEdsSdk;
    use crate::camera::canon::status::EDS_ERR_DEVICE_BUSY;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPump(AtomicUsize);

    impl NotificationPump for CountingPump {
        fn pump_pending(&self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    const TICK: Duration = Duration::from_millis(5);

    #[test]
    fn sdk_event_pump_calls_get_event() {
        let sdk = Arc::new(MockEdsSdk::new());
        let pump = SdkEventPump::new(Arc::clone(&sdk));
        pump.pump_pending().unwrap();
        pump.pump_pending().unwrap();
        assert_eq!(sdk.events_processed(), 2);
    }

    #[test]
    fn chained_pumps_run_in_order() {
        let sdk = Arc::new(MockEdsSdk::new());
        let chained = (CountingPump(AtomicUsize::new(0)), SdkEventPump::new(Arc::clone(&sdk)));
        chained.pump_pending().unwrap();
        assert_eq!(chained.0 .0.load(Ordering::SeqCst), 1);
        assert_eq!(sdk.events_processed(), 1);
    }

    #[test]
    fn times_out_when_nothing_arrives() {
        let slot = TransferSlot::new();
        slot.arm(PathBuf::from("a.CR2")).unwrap();
        let pump = CountingPump(AtomicUsize::new(0));

        let started = Instant::now();
        let err = wait_for_signal(&slot, &pump, Duration::from_millis(50), TICK).unwrap_err();

        assert!(matches!(err, CameraError::Timeout(d) if d == Duration::from_millis(50)));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(50) + 20 * TICK, "took {elapsed:?}");
        assert!(pump.0.load(Ordering::SeqCst) > 1);
        assert!(!slot.is_armed());
    }

    #[test]
    fn timeout_during_download_blocks_the_next_capture_until_it_finishes() {
        let slot = TransferSlot::new();
        slot.arm(PathBuf::from("first.CR2")).unwrap();
        let first = slot.claim().unwrap();
        let pump = CountingPump(AtomicUsize::new(0));

        let err = wait_for_signal(&slot, &pump, Duration::from_millis(20), TICK).unwrap_err();
        assert!(matches!(err, CameraError::Timeout(_)));
        assert!(matches!(
            slot.arm(PathBuf::from("second.CR2")),
            Err(CameraError::CaptureInProgress)
        ));

        // The late download completes; its receipt goes nowhere.
        assert!(!slot.finish(Ok(TransferReceipt {
            path: first,
            file_name: "IMG_0001.CR2".to_string(),
            size: 1,
        })));

        slot.arm(PathBuf::from("second.CR2")).unwrap();
        let second = slot.claim().unwrap();
        slot.finish(Ok(TransferReceipt {
            path: second,
            file_name: "IMG_0002.CR2".to_string(),
            size: 2,
        }));
        let receipt = wait_for_signal(&slot, &pump, Duration::from_secs(1), TICK).unwrap();
        assert_eq!(receipt.path, PathBuf::from("second.CR2"));
    }

    #[test]
    fn returns_the_result_published_while_pumping() {
        struct FinishingPump<'a>(&'a TransferSlot);

        impl NotificationPump for FinishingPump<'_> {
            fn pump_pending(&self) -> Result<()> {
                if let Some(path) = self.0.claim() {
                    self.0.finish(Ok(TransferReceipt {
                        path,
                        file_name: "IMG_0001.CR2".to_string(),
                        size: 1,
                    }));
                }
                Ok(())
            }
        }

        let slot = TransferSlot::new();
        slot.arm(PathBuf::from("a.CR2")).unwrap();
        let receipt =
            wait_for_signal(&slot, &FinishingPump(&slot), Duration::from_secs(5), TICK).unwrap();
        assert_eq!(receipt.path, PathBuf::from("a.CR2"));
    }

    #[test]
    fn pump_failure_propagates() {
        let sdk = Arc::new(MockEdsSdk::new().with_error("get_event", EDS_ERR_DEVICE_BUSY));
        let pump = SdkEventPump::new(Arc::clone(&sdk));
        let slot = TransferSlot::new();
        let err = wait_for_signal(&slot, &pump, Duration::from_secs(1), TICK).unwrap_err();
        assert_eq!(err.sdk_code(), Some(EDS_ERR_DEVICE_BUSY));
    }

    #[test]
    fn default_pump_polls_the_sdk() {
        let sdk = Arc::new(MockEdsSdk::new());
        let pump = default_pump(&sdk);
        pump.pump_pending().unwrap();
        assert_eq!(sdk.events_processed(), 1);
    }
}
