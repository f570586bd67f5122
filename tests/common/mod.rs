#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use dimly_torch::{
    AppLaunch, Duration, HardwareFault, HostShell, ShellError, SosTimings, TorchCapability,
    TorchDevice,
};

/// Device call as seen by the fake flash unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorchCall {
    On(bool),
    Level(u32),
}

/// Shared view of the calls a [`RecordingTorch`] received
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<TorchCall>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<TorchCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<TorchCall> {
        self.0.lock().unwrap().last().copied()
    }

    pub fn count(&self, call: TorchCall) -> usize {
        self.0.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    fn push(&self, call: TorchCall) -> usize {
        let mut calls = self.0.lock().unwrap();
        calls.push(call);
        calls.len()
    }
}

/// Fake flash unit recording every call
pub struct RecordingTorch {
    capability: Option<TorchCapability>,
    log: CallLog,
    fail_from: Option<usize>,
}

impl RecordingTorch {
    pub fn new(capability: Option<TorchCapability>) -> (Self, CallLog) {
        let log = CallLog::default();
        let device = Self {
            capability,
            log: log.clone(),
            fail_from: None,
        };
        (device, log)
    }

    /// Device whose `nth` call (1-based) and every later one fail
    pub fn failing_from(capability: Option<TorchCapability>, nth: usize) -> (Self, CallLog) {
        let (mut device, log) = Self::new(capability);
        device.fail_from = Some(nth);
        (device, log)
    }

    fn record(&self, call: TorchCall) -> Result<(), HardwareFault> {
        let count = self.log.push(call);
        match self.fail_from {
            Some(nth) if count >= nth => Err(HardwareFault::new("camera in use")),
            _ => Ok(()),
        }
    }
}

impl TorchDevice for RecordingTorch {
    fn capability(&self) -> Option<TorchCapability> {
        self.capability
    }

    fn set_on(&mut self, on: bool) -> Result<(), HardwareFault> {
        self.record(TorchCall::On(on))
    }

    fn set_level(&mut self, level: u32) -> Result<(), HardwareFault> {
        self.record(TorchCall::Level(level))
    }
}

/// Fake host shell with scriptable failures
#[derive(Debug, Default)]
pub struct RecordingShell {
    pub calls: Vec<&'static str>,
    pub quick_settings_fails: bool,
    pub settings_fails: bool,
    pub service_fails: bool,
    pub app_fails: bool,
    /// Screens passed to `open_app` and `announce_launch`, in call order
    pub launches: Vec<AppLaunch>,
}

impl RecordingShell {
    fn outcome(&mut self, call: &'static str, fails: bool) -> Result<(), ShellError> {
        self.calls.push(call);
        if fails {
            Err(ShellError::new("activity not found"))
        } else {
            Ok(())
        }
    }
}

impl HostShell for RecordingShell {
    fn open_quick_settings(&mut self) -> Result<(), ShellError> {
        self.outcome("open_quick_settings", self.quick_settings_fails)
    }

    fn open_settings(&mut self) -> Result<(), ShellError> {
        self.outcome("open_settings", self.settings_fails)
    }

    fn start_background_service(&mut self) -> Result<(), ShellError> {
        self.outcome("start_background_service", self.service_fails)
    }

    fn stop_background_service(&mut self) -> Result<(), ShellError> {
        self.outcome("stop_background_service", self.service_fails)
    }

    fn open_app(&mut self, launch: AppLaunch) -> Result<(), ShellError> {
        self.launches.push(launch);
        self.outcome("open_app", self.app_fails)
    }

    fn announce_launch(&mut self, launch: AppLaunch) -> Result<(), ShellError> {
        self.launches.push(launch);
        self.outcome("announce_launch", self.app_fails)
    }
}

/// SOS timings ten times faster than the real pattern
pub const FAST_SOS: SosTimings = SosTimings {
    dot: Duration::from_millis(20),
    dash: Duration::from_millis(60),
    element_gap: Duration::from_millis(20),
    letter_gap: Duration::from_millis(40),
};
