//! Torch hardware seam and intensity mapping.
//!
//! The host platform implements [`TorchDevice`] on top of its camera API.
//! [`TorchController`] owns the device, maps a continuous intensity in
//! `[0, 1]` to the command the hardware understands and serializes access so
//! it can be shared with the SOS worker thread.

use core::cell::RefCell;

use critical_section::Mutex;
use log::debug;

use crate::error::{HardwareFault, TorchError};

/// Flash unit facts reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TorchCapability {
    pub available: bool,
    /// Highest discrete strength level; `1` means on/off only.
    pub max_strength_level: u32,
}

impl TorchCapability {
    /// On/off flash without strength control
    pub const fn binary() -> Self {
        Self {
            available: true,
            max_strength_level: 1,
        }
    }

    /// Flash with `max_strength_level` discrete steps
    pub const fn with_levels(max_strength_level: u32) -> Self {
        Self {
            available: true,
            max_strength_level: if max_strength_level == 0 {
                1
            } else {
                max_strength_level
            },
        }
    }

    /// Returns true if the flash accepts strength levels
    pub const fn is_dimmable(self) -> bool {
        self.max_strength_level > 1
    }
}

/// Abstract torch driver
///
/// Implement this trait to bind a platform camera API.
/// The controller is generic over this trait.
pub trait TorchDevice {
    /// Describe the flash unit, `None` if the device has none
    fn capability(&self) -> Option<TorchCapability>;

    /// Switch the torch fully on or off
    fn set_on(&mut self, on: bool) -> Result<(), HardwareFault>;

    /// Turn the torch on at a strength level in `1..=max_strength_level`
    fn set_level(&mut self, level: u32) -> Result<(), HardwareFault>;
}

/// Hardware command derived from a requested intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TorchCommand {
    Off,
    On,
    /// Strength level, always within `1..=max_strength_level`
    Level(u32),
}

impl TorchCommand {
    /// Map an intensity to a hardware command.
    ///
    /// Non-positive and NaN intensities switch the torch off. Dimmable
    /// hardware gets `round(intensity * max)` with halves rounded up and the
    /// result clamped to `1..=max`; binary hardware is simply switched on.
    pub fn plan(intensity: f32, capability: TorchCapability) -> Self {
        if intensity.is_nan() || intensity <= 0.0 {
            return Self::Off;
        }
        if !capability.is_dimmable() {
            return Self::On;
        }

        let max = capability.max_strength_level;
        let scaled = libm::floorf(intensity.min(1.0) * max as f32 + 0.5);
        Self::Level((scaled as u32).clamp(1, max))
    }

    /// Returns true if the command leaves the torch lit
    pub const fn is_lit(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Torch controller - maps intensities to device calls
pub struct TorchController<D: TorchDevice> {
    device: Mutex<RefCell<D>>,
}

impl<D: TorchDevice> TorchController<D> {
    /// Create a controller that owns the device.
    pub const fn new(device: D) -> Self {
        Self {
            device: Mutex::new(RefCell::new(device)),
        }
    }

    /// Current flash capability as reported by the device
    pub fn capability(&self) -> Option<TorchCapability> {
        critical_section::with(|cs| self.device.borrow(cs).borrow().capability())
    }

    /// Returns true if a usable flash unit is present
    pub fn is_available(&self) -> bool {
        self.usable_capability().is_ok()
    }

    /// Apply a requested intensity in `[0, 1]`.
    ///
    /// Issues exactly one device call and returns the command it carried.
    pub fn set_intensity(&self, intensity: f32) -> Result<TorchCommand, TorchError> {
        let capability = self.usable_capability()?;
        let command = TorchCommand::plan(intensity, capability);
        self.apply(command)?;
        Ok(command)
    }

    /// Switch the torch on or off regardless of strength support
    pub fn set_on(&self, on: bool) -> Result<(), TorchError> {
        self.usable_capability()?;
        self.apply(if on { TorchCommand::On } else { TorchCommand::Off })
    }

    /// Switch the torch off.
    pub fn turn_off(&self) -> Result<(), TorchError> {
        self.set_on(false)
    }

    fn usable_capability(&self) -> Result<TorchCapability, TorchError> {
        match self.capability() {
            Some(capability) if capability.available => Ok(capability),
            _ => Err(TorchError::Unavailable),
        }
    }

    fn apply(&self, command: TorchCommand) -> Result<(), TorchError> {
        debug!("[TorchController.apply] {:?}", command);
        critical_section::with(|cs| {
            let mut device = self.device.borrow(cs).borrow_mut();
            match command {
                TorchCommand::Off => device.set_on(false),
                TorchCommand::On => device.set_on(true),
                TorchCommand::Level(level) => device.set_level(level),
            }
        })?;
        Ok(())
    }
}
