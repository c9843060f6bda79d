//! In-memory platform audio service
//!
//! [`SimulatedAudioService`] stands in for the native audio service in tests
//! and demos. It keeps a device list and capability flags, records every call
//! made against it, can be told to fail, and lets the caller fire device and
//! hands-free notifications by hand.
//!
//! Clones share state, so a test can keep one handle while the manager owns
//! another.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::platform::{
    DeviceListener, HandsFreeListener, ListenerKind, ListenerRegistration, PlatformAudioService,
    PlatformError, PlatformResult,
};
use crate::types::{DeviceChange, DeviceKind, RawDevice};

/// How many times each platform operation was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub enumerate: usize,
    pub set_hands_free_requested: usize,
    pub start_negotiation: usize,
    pub stop_negotiation: usize,
    pub register_device_listener: usize,
    pub register_hands_free_listener: usize,
}

struct SimulatedState {
    devices: Vec<RawDevice>,
    supports_enumeration: bool,
    hands_free_off_call: bool,
    wired_headset: bool,
    sticky_hands_free_state: Option<i32>,
    negotiation_state: Option<i32>,

    enumeration_failure: Option<PlatformError>,
    hands_free_failure: Option<PlatformError>,
    registration_failure: bool,

    hands_free_requested: bool,
    negotiating: bool,
    calls: CallCounts,

    device_listeners: HashMap<Uuid, DeviceListener>,
    hands_free_listeners: HashMap<Uuid, HandsFreeListener>,
}

impl Default for SimulatedState {
    fn default() -> Self {
        Self {
            devices: vec![
                RawDevice::output(1, DeviceKind::BuiltinEarpiece),
                RawDevice::output(2, DeviceKind::BuiltinSpeaker),
            ],
            supports_enumeration: true,
            hands_free_off_call: false,
            wired_headset: false,
            sticky_hands_free_state: None,
            negotiation_state: None,
            enumeration_failure: None,
            hands_free_failure: None,
            registration_failure: false,
            hands_free_requested: false,
            negotiating: false,
            calls: CallCounts::default(),
            device_listeners: HashMap::new(),
            hands_free_listeners: HashMap::new(),
        }
    }
}

/// Simulated platform audio service
///
/// Starts with a built-in earpiece and speaker and per-device enumeration
/// enabled.
#[derive(Clone, Default)]
pub struct SimulatedAudioService {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedAudioService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the attached device list
    pub fn with_devices(self, devices: Vec<RawDevice>) -> Self {
        self.set_devices(devices);
        self
    }

    /// Set the enumeration capability probe result
    pub fn with_device_enumeration(self, supported: bool) -> Self {
        self.state.lock().supports_enumeration = supported;
        self
    }

    pub fn with_hands_free_available_off_call(self, available: bool) -> Self {
        self.set_hands_free_available_off_call(available);
        self
    }

    pub fn with_wired_headset(self, connected: bool) -> Self {
        self.set_wired_headset(connected);
        self
    }

    /// Deliver `state` to every hands-free listener as soon as it registers
    pub fn with_sticky_hands_free_state(self, state: i32) -> Self {
        self.state.lock().sticky_hands_free_state = Some(state);
        self
    }

    /// Report `state` to hands-free listeners from inside a successful
    /// negotiation start, before it returns
    pub fn with_negotiation_state(self, state: i32) -> Self {
        self.state.lock().negotiation_state = Some(state);
        self
    }

    /// Make enumeration and capability queries fail with `error`
    pub fn with_enumeration_failure(self, error: PlatformError) -> Self {
        self.set_enumeration_failure(Some(error));
        self
    }

    /// Make hands-free requests fail with `error`
    pub fn with_hands_free_failure(self, error: PlatformError) -> Self {
        self.set_hands_free_failure(Some(error));
        self
    }

    pub fn with_registration_failure(self, fail: bool) -> Self {
        self.set_registration_failure(fail);
        self
    }

    pub fn set_devices(&self, devices: Vec<RawDevice>) {
        self.state.lock().devices = devices;
    }

    pub fn set_hands_free_available_off_call(&self, available: bool) {
        self.state.lock().hands_free_off_call = available;
    }

    pub fn set_wired_headset(&self, connected: bool) {
        self.state.lock().wired_headset = connected;
    }

    pub fn set_enumeration_failure(&self, error: Option<PlatformError>) {
        self.state.lock().enumeration_failure = error;
    }

    pub fn set_hands_free_failure(&self, error: Option<PlatformError>) {
        self.state.lock().hands_free_failure = error;
    }

    pub fn set_registration_failure(&self, fail: bool) {
        self.state.lock().registration_failure = fail;
    }

    /// Add a device and notify device listeners
    pub fn attach_device(&self, device: RawDevice) {
        self.state.lock().devices.push(device.clone());
        self.fire_device_change(DeviceChange::Attached(vec![device]));
    }

    /// Remove a device by id and notify device listeners
    pub fn detach_device(&self, id: i32) {
        let removed: Vec<RawDevice> = {
            let mut state = self.state.lock();
            let (removed, kept): (Vec<RawDevice>, Vec<RawDevice>) =
                state.devices.drain(..).partition(|d| d.id == id);
            state.devices = kept;
            removed
        };
        if !removed.is_empty() {
            self.fire_device_change(DeviceChange::Detached(removed));
        }
    }

    /// Deliver a device change to every registered device listener
    pub fn fire_device_change(&self, change: DeviceChange) {
        // Listeners run without the state lock held
        let listeners: Vec<DeviceListener> =
            self.state.lock().device_listeners.values().cloned().collect();
        for listener in listeners {
            listener(change.clone());
        }
    }

    /// Deliver a raw hands-free link state to every registered listener
    pub fn fire_hands_free_state(&self, code: i32) {
        let listeners: Vec<HandsFreeListener> =
            self.state.lock().hands_free_listeners.values().cloned().collect();
        for listener in listeners {
            listener(code);
        }
    }

    pub fn call_counts(&self) -> CallCounts {
        self.state.lock().calls
    }

    pub fn device_listener_count(&self) -> usize {
        self.state.lock().device_listeners.len()
    }

    pub fn hands_free_listener_count(&self) -> usize {
        self.state.lock().hands_free_listeners.len()
    }

    /// Last value passed to `set_hands_free_requested`
    pub fn hands_free_requested(&self) -> bool {
        self.state.lock().hands_free_requested
    }

    pub fn is_negotiating(&self) -> bool {
        self.state.lock().negotiating
    }

    fn check_hands_free(&self) -> PlatformResult<()> {
        match &self.state.lock().hands_free_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn release_listener(state: &Weak<Mutex<SimulatedState>>, kind: ListenerKind, id: Uuid) {
        let Some(state) = state.upgrade() else {
            return;
        };
        let mut state = state.lock();
        match kind {
            ListenerKind::Device => {
                state.device_listeners.remove(&id);
            }
            ListenerKind::HandsFree => {
                state.hands_free_listeners.remove(&id);
            }
        }
    }
}

impl fmt::Debug for SimulatedAudioService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SimulatedAudioService")
            .field("devices", &state.devices)
            .field("supports_enumeration", &state.supports_enumeration)
            .field("device_listeners", &state.device_listeners.len())
            .field("hands_free_listeners", &state.hands_free_listeners.len())
            .finish()
    }
}

impl PlatformAudioService for SimulatedAudioService {
    fn supports_device_enumeration(&self) -> bool {
        self.state.lock().supports_enumeration
    }

    fn enumerate_output_devices(&self) -> PlatformResult<Vec<RawDevice>> {
        let mut state = self.state.lock();
        state.calls.enumerate += 1;
        if let Some(error) = &state.enumeration_failure {
            return Err(error.clone());
        }
        if !state.supports_enumeration {
            return Err(PlatformError::unsupported("enumerate_output_devices"));
        }
        Ok(state.devices.iter().filter(|d| d.is_output()).cloned().collect())
    }

    fn set_hands_free_requested(&self, requested: bool) -> PlatformResult<()> {
        self.state.lock().calls.set_hands_free_requested += 1;
        self.check_hands_free()?;
        self.state.lock().hands_free_requested = requested;
        Ok(())
    }

    fn start_hands_free_negotiation(&self) -> PlatformResult<()> {
        self.state.lock().calls.start_negotiation += 1;
        self.check_hands_free()?;
        let immediate = {
            let mut state = self.state.lock();
            state.negotiating = true;
            state.negotiation_state
        };
        if let Some(code) = immediate {
            self.fire_hands_free_state(code);
        }
        Ok(())
    }

    fn stop_hands_free_negotiation(&self) -> PlatformResult<()> {
        self.state.lock().calls.stop_negotiation += 1;
        self.check_hands_free()?;
        self.state.lock().negotiating = false;
        Ok(())
    }

    fn is_hands_free_available_off_call(&self) -> PlatformResult<bool> {
        let state = self.state.lock();
        match &state.enumeration_failure {
            Some(error) => Err(error.clone()),
            None => Ok(state.hands_free_off_call),
        }
    }

    fn is_wired_headset_connected(&self) -> PlatformResult<bool> {
        let state = self.state.lock();
        match &state.enumeration_failure {
            Some(error) => Err(error.clone()),
            None => Ok(state.wired_headset),
        }
    }

    fn register_device_listener(
        &self,
        listener: DeviceListener,
    ) -> PlatformResult<ListenerRegistration> {
        let id = Uuid::new_v4();
        {
            let mut state = self.state.lock();
            state.calls.register_device_listener += 1;
            if state.registration_failure {
                return Err(PlatformError::rejected("device callback registration refused"));
            }
            state.device_listeners.insert(id, listener);
        }

        let weak = Arc::downgrade(&self.state);
        Ok(ListenerRegistration::with_id(id, ListenerKind::Device, move || {
            Self::release_listener(&weak, ListenerKind::Device, id)
        }))
    }

    fn register_hands_free_listener(
        &self,
        listener: HandsFreeListener,
    ) -> PlatformResult<ListenerRegistration> {
        let id = Uuid::new_v4();
        let sticky = {
            let mut state = self.state.lock();
            state.calls.register_hands_free_listener += 1;
            if state.registration_failure {
                return Err(PlatformError::rejected("receiver registration refused"));
            }
            state.hands_free_listeners.insert(id, listener.clone());
            state.sticky_hands_free_state
        };

        if let Some(code) = sticky {
            listener(code);
        }

        let weak = Arc::downgrade(&self.state);
        Ok(ListenerRegistration::with_id(id, ListenerKind::HandsFree, move || {
            Self::release_listener(&weak, ListenerKind::HandsFree, id)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn test_enumeration_filters_inputs() {
        let platform = SimulatedAudioService::new().with_devices(vec![
            RawDevice::input(1, DeviceKind::BuiltinEarpiece),
            RawDevice::output(2, DeviceKind::BuiltinSpeaker),
        ]);
        let devices = platform.enumerate_output_devices().unwrap();
        assert_eq!(devices, vec![RawDevice::output(2, DeviceKind::BuiltinSpeaker)]);
        assert_eq!(platform.call_counts().enumerate, 1);
    }

    #[test]
    fn test_enumeration_unsupported() {
        let platform = SimulatedAudioService::new().with_device_enumeration(false);
        assert!(matches!(
            platform.enumerate_output_devices(),
            Err(PlatformError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_released_listener_stops_receiving() {
        let platform = SimulatedAudioService::new();
        let seen = Arc::new(AtomicI32::new(-1));
        let sink = seen.clone();
        let registration = platform
            .register_hands_free_listener(Arc::new(move |code: i32| sink.store(code, Ordering::SeqCst)))
            .unwrap();

        platform.fire_hands_free_state(1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        registration.release();
        assert_eq!(platform.hands_free_listener_count(), 0);

        platform.fire_hands_free_state(2);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_detach_unknown_device_is_silent() {
        let platform = SimulatedAudioService::new();
        let fired = Arc::new(AtomicI32::new(0));
        let counter = fired.clone();
        let _registration = platform
            .register_device_listener(Arc::new(move |_: DeviceChange| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        platform.detach_device(99);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        platform.detach_device(2);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(
            platform.enumerate_output_devices().unwrap(),
            vec![RawDevice::output(1, DeviceKind::BuiltinEarpiece)]
        );
    }

    #[test]
    fn test_hands_free_failure() {
        let platform =
            SimulatedAudioService::new().with_hands_free_failure(PlatformError::rejected("busy"));
        assert!(platform.set_hands_free_requested(true).is_err());
        assert!(!platform.hands_free_requested());
        assert_eq!(platform.call_counts().set_hands_free_requested, 1);
    }
}
