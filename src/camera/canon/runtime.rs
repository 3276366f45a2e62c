//! Process-wide SDK initialisation, shared through leases.
//!
//! `EdsInitializeSDK` runs when the first lease is taken and
//! `EdsTerminateSDK` when the last one is dropped. Open cameras and
//! discovery passes each hold a lease, so the SDK never terminates
//! underneath a live session.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::camera::error::Result;

use super::api::EdsSdkApi;

/// Owner of the SDK boundary and its use count.
pub struct SdkRuntime<S: EdsSdkApi> {
    sdk: Arc<S>,
    users: Mutex<usize>,
}

impl<S: EdsSdkApi> SdkRuntime<S> {
    pub fn new(sdk: S) -> Arc<Self> {
        Self::from_arc(Arc::new(sdk))
    }

    pub fn from_arc(sdk: Arc<S>) -> Arc<Self> {
        Arc::new(Self {
            sdk,
            users: Mutex::new(0),
        })
    }

    pub fn sdk(&self) -> &Arc<S> {
        &self.sdk
    }

    /// Number of live leases.
    pub fn users(&self) -> usize {
        *self.users.lock()
    }

    /// Take a lease, initialising the SDK if this is the first one.
    pub fn acquire(self: &Arc<Self>) -> Result<SdkLease<S>> {
        let mut users = self.users.lock();
        if *users == 0 {
            self.sdk.initialize()?;
            tracing::info!("EDSDK initialized");
        }
        *users += 1;
        Ok(SdkLease {
            runtime: Arc::clone(self),
        })
    }

    fn release(&self) {
        let mut users = self.users.lock();
        *users = users.saturating_sub(1);
        if *users == 0 {
            match self.sdk.terminate() {
                Ok(()) => tracing::info!("EDSDK terminated"),
                Err(e) => tracing::warn!("Failed to terminate EDSDK: {e}"),
            }
        }
    }
}

/// Keeps the SDK initialised while alive.
pub struct SdkLease<S: EdsSdkApi> {
    runtime: Arc<SdkRuntime<S>>,
}

impl<S: EdsSdkApi> SdkLease<S> {
    pub fn runtime(&self) -> &Arc<SdkRuntime<S>> {
        &self.runtime
    }

    pub fn sdk(&self) -> &Arc<S> {
        self.runtime.sdk()
    }
}

impl<S: EdsSdkApi> Drop for SdkLease<S> {
    fn drop(&mut self) {
        self.runtime.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::canon::mock::MockEdsSdk;
    use crate::camera::canon::status::EDS_ERR_INTERNAL_ERROR;

    #[test]
    fn initialize_once_terminate_at_zero() {
        let runtime = SdkRuntime::new(MockEdsSdk::new());

        let a = runtime.acquire().unwrap();
        let b = runtime.acquire().unwrap();
        assert_eq!(runtime.sdk().initialized(), 1);
        assert_eq!(runtime.users(), 2);

        drop(a);
        assert_eq!(runtime.sdk().terminated(), 0);

        drop(b);
        assert_eq!(runtime.sdk().terminated(), 1);
        assert_eq!(runtime.users(), 0);
    }

    #[test]
    fn reacquire_after_teardown_initializes_again() {
        let runtime = SdkRuntime::new(MockEdsSdk::new());
        drop(runtime.acquire().unwrap());
        drop(runtime.acquire().unwrap());
        assert_eq!(runtime.sdk().initialized(), 2);
        assert_eq!(runtime.sdk().terminated(), 2);
    }

    #[test]
    fn failed_initialize_takes_no_lease() {
        let runtime = SdkRuntime::new(MockEdsSdk::new().with_error("initialize", EDS_ERR_INTERNAL_ERROR));
        assert!(runtime.acquire().is_err());
        assert_eq!(runtime.users(), 0);

        let _lease = runtime.acquire().unwrap();
        assert_eq!(runtime.users(), 1);
        assert_eq!(runtime.sdk().initialized(), 1);
    }

    #[test]
    fn leases_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SdkLease<MockEdsSdk>>();
        assert_send_sync::<SdkRuntime<MockEdsSdk>>();
    }
}
