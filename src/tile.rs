//! Quick Settings tiles
//!
//! The flashlight tile cycles `off -> 25% -> 65% -> 100% -> off` on every
//! tap and remembers the selected step across restarts. The SOS tile only
//! reflects the player state, and the ambient tile just opens the app.

use std::sync::Arc;

use log::{debug, warn};

use crate::error::TorchError;
use crate::store::KeyValueStore;
use crate::torch::{TorchController, TorchDevice};

/// Intensities selectable from the flashlight tile, in cycle order.
pub const BRIGHTNESS_LEVELS: [f32; 3] = [0.25, 0.65, 1.0];

/// Preference key holding the selected brightness index.
pub const BRIGHTNESS_KEY: &str = "brightness_index";

const OFF_INDEX: i8 = -1;

const LABEL_OFF: &str = "off";
const LABEL_LOW: &str = "25%";
const LABEL_MEDIUM: &str = "65%";
const LABEL_HIGH: &str = "100%";

/// Rendered state of a Quick Settings tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    Active,
    Inactive,
}

/// Everything the host needs to draw a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileView {
    pub state: TileState,
    pub label: &'static str,
    pub description: &'static str,
}

impl TileView {
    /// View of the SOS tile
    pub const fn sos(playing: bool) -> Self {
        if playing {
            Self {
                state: TileState::Active,
                label: "SOS",
                description: "SOS Active",
            }
        } else {
            Self {
                state: TileState::Inactive,
                label: "SOS",
                description: "Activate SOS",
            }
        }
    }

    /// View of the ambient tile. It only opens the app, so it never shows active.
    pub const fn ambient() -> Self {
        Self {
            state: TileState::Inactive,
            label: "Ambient",
            description: "Open Dimly for ambient light control",
        }
    }
}

/// Selected flashlight tile step.
///
/// The index is always one of `-1` (off), `0`, `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessState {
    index: i8,
}

impl Default for BrightnessState {
    fn default() -> Self {
        Self::OFF
    }
}

impl BrightnessState {
    pub const OFF: Self = Self { index: OFF_INDEX };

    /// Decode a persisted index, `None` if it is out of range
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            -1..=2 => Some(Self { index: raw as i8 }),
            _ => None,
        }
    }

    pub const fn index(self) -> i8 {
        self.index
    }

    pub const fn is_off(self) -> bool {
        self.index == OFF_INDEX
    }

    /// Following step in the cycle, wrapping back to off after the last level
    pub const fn next(self) -> Self {
        let levels = BRIGHTNESS_LEVELS.len() as i8;
        let mut index = (self.index + 1) % (levels + 1);
        if index >= levels {
            index = OFF_INDEX;
        }
        Self { index }
    }

    /// Torch intensity for this step, `0.0` when off
    pub fn intensity(self) -> f32 {
        usize::try_from(self.index)
            .ok()
            .and_then(|index| BRIGHTNESS_LEVELS.get(index).copied())
            .unwrap_or(0.0)
    }

    /// Short label: `off`, `25%`, `65%` or `100%`
    pub const fn label(self) -> &'static str {
        match self.index {
            0 => LABEL_LOW,
            1 => LABEL_MEDIUM,
            2 => LABEL_HIGH,
            _ => LABEL_OFF,
        }
    }

    /// Tile rendering for this step
    pub const fn view(self) -> TileView {
        match self.index {
            0 => TileView {
                state: TileState::Active,
                label: "Dimly 25%",
                description: "Flashlight 25% Brightness",
            },
            1 => TileView {
                state: TileState::Active,
                label: "Dimly 65%",
                description: "Flashlight 65% Brightness",
            },
            2 => TileView {
                state: TileState::Active,
                label: "Dimly 100%",
                description: "Flashlight 100% Brightness",
            },
            _ => TileView {
                state: TileState::Inactive,
                label: "Dimly",
                description: "Flashlight Off",
            },
        }
    }
}

/// Result of a tile tap.
///
/// The state always advances; `torch` tells whether the hardware followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub state: BrightnessState,
    pub torch: Result<(), TorchError>,
}

/// Flashlight tile - brightness cycler with persisted selection
pub struct FlashlightTile<D: TorchDevice, S: KeyValueStore> {
    torch: Arc<TorchController<D>>,
    store: S,
    key: &'static str,
    state: BrightnessState,
}

impl<D: TorchDevice, S: KeyValueStore> FlashlightTile<D, S> {
    /// Create a tile and restore its last selection from `store`
    pub fn new(torch: Arc<TorchController<D>>, store: S) -> Self {
        Self::with_key(torch, store, BRIGHTNESS_KEY)
    }

    /// Create a tile persisting its selection under `key`
    pub fn with_key(torch: Arc<TorchController<D>>, store: S, key: &'static str) -> Self {
        let state = Self::load(&store, key);
        debug!("[FlashlightTile] restored brightness index {}", state.index());
        Self {
            torch,
            store,
            key,
            state,
        }
    }

    fn load(store: &S, key: &str) -> BrightnessState {
        match store.get_int(key, i32::from(OFF_INDEX)) {
            Ok(raw) => BrightnessState::from_raw(raw).unwrap_or_else(|| {
                warn!("[FlashlightTile] ignoring stored brightness index {}", raw);
                BrightnessState::OFF
            }),
            Err(err) => {
                warn!("[FlashlightTile] {}, starting off", err);
                BrightnessState::OFF
            }
        }
    }

    /// Advance to the next brightness step.
    ///
    /// The new step is persisted before the torch is driven. Persistence
    /// failures are logged and do not stop the torch update.
    pub fn activate(&mut self) -> Activation {
        let next = self.state.next();
        self.state = next;

        if let Err(err) = self.store.put_int(self.key, i32::from(next.index())) {
            warn!("[FlashlightTile] could not persist brightness: {}", err);
        }

        let torch = self.torch.set_intensity(next.intensity()).map(|_| ());
        if let Err(err) = &torch {
            warn!("[FlashlightTile] could not apply {}: {}", next.label(), err);
        }

        Activation { state: next, torch }
    }

    pub const fn state(&self) -> BrightnessState {
        self.state
    }

    pub const fn view(&self) -> TileView {
        self.state.view()
    }

    /// Release the backing store
    pub fn into_store(self) -> S {
        self.store
    }
}
