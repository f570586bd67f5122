//! Commands accepted from the application shell and the tiles.
//!
//! Each method-channel call and each tile tap is decoded into one [`Command`]
//! variant; the dispatcher matches them exhaustively.

use crate::tile::BrightnessState;

const CHANNEL_NAME_TORCH: &str = "com.example.dimly/torch";
const CHANNEL_NAME_QUICK_SETTINGS: &str = "com.example.dimly/quicksettings";
const CHANNEL_NAME_BACKGROUND_SERVICE: &str = "com.example.dimly/background_service";
const CHANNEL_NAME_TILE: &str = "com.example.dimly/tile";
const CHANNEL_NAME_AMBIENT: &str = "com.example.dimly/ambient";
const CHANNEL_NAME_SOS: &str = "com.example.dimly/sos";

const METHOD_SET_TORCH: &str = "setTorch";
const METHOD_IS_QUICK_TILE_ADDED: &str = "isQuickTileAdded";
const METHOD_ADD_QUICK_SETTINGS_TILE: &str = "addQuickSettingsTile";
const METHOD_REMOVE_QUICK_SETTINGS_TILE: &str = "removeQuickSettingsTile";
const METHOD_OPEN_QUICK_SETTINGS: &str = "openQuickSettings";
const METHOD_START_BACKGROUND_SERVICE: &str = "startBackgroundService";
const METHOD_STOP_BACKGROUND_SERVICE: &str = "stopBackgroundService";
const METHOD_CYCLE_BRIGHTNESS: &str = "cycleBrightness";
const METHOD_START_SOS: &str = "startSos";
const METHOD_STOP_SOS: &str = "stopSos";
const METHOD_TOGGLE_SOS: &str = "toggleSos";
const METHOD_ACTIVATE_AMBIENT: &str = "activateAmbient";
const METHOD_ACTIVATE_AMBIENT_MODE: &str = "activateAmbientMode";
const METHOD_ACTIVATE_SOS_MODE: &str = "activateSOSMode";

const EXTRA_ACTIVATE_AMBIENT: &str = "activate_ambient";
const EXTRA_ACTIVATE_SOS: &str = "activate_sos";

/// Named endpoints between the crate and the application shell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MethodChannel {
    Torch,
    QuickSettings,
    BackgroundService,
    /// Taps forwarded by the tile services
    Tile,
    /// Shell-bound only: ambient screen light requested from a tile
    Ambient,
    /// Shell-bound only: SOS screen requested from a tile
    Sos,
}

impl MethodChannel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Torch => CHANNEL_NAME_TORCH,
            Self::QuickSettings => CHANNEL_NAME_QUICK_SETTINGS,
            Self::BackgroundService => CHANNEL_NAME_BACKGROUND_SERVICE,
            Self::Tile => CHANNEL_NAME_TILE,
            Self::Ambient => CHANNEL_NAME_AMBIENT,
            Self::Sos => CHANNEL_NAME_SOS,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            CHANNEL_NAME_TORCH => Some(Self::Torch),
            CHANNEL_NAME_QUICK_SETTINGS => Some(Self::QuickSettings),
            CHANNEL_NAME_BACKGROUND_SERVICE => Some(Self::BackgroundService),
            CHANNEL_NAME_TILE => Some(Self::Tile),
            CHANNEL_NAME_AMBIENT => Some(Self::Ambient),
            CHANNEL_NAME_SOS => Some(Self::Sos),
            _ => None,
        }
    }
}

/// Operation requested by the shell or a tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Drive the torch at an intensity in `[0, 1]`
    SetTorch { intensity: f32 },
    /// Flashlight tile tap
    CycleBrightness,
    StartSos,
    StopSos,
    /// SOS tile tap. On a locked device the tile opens the app instead.
    ToggleSos { locked: bool },
    /// Ambient tile tap
    ActivateAmbient,
    IsQuickTileAdded,
    AddQuickSettingsTile,
    RemoveQuickSettingsTile,
    OpenQuickSettings,
    StartBackgroundService,
    StopBackgroundService,
}

impl Command {
    /// Decode a method call. Returns `None` for unknown methods and for the
    /// shell-bound channels.
    pub fn parse(channel: MethodChannel, method: &str, args: CallArgs) -> Option<Self> {
        Some(match (channel, method) {
            (MethodChannel::Torch, METHOD_SET_TORCH) => Self::SetTorch {
                intensity: args.intensity.unwrap_or(0.0) as f32,
            },
            (MethodChannel::QuickSettings, METHOD_IS_QUICK_TILE_ADDED) => Self::IsQuickTileAdded,
            (MethodChannel::QuickSettings, METHOD_ADD_QUICK_SETTINGS_TILE) => {
                Self::AddQuickSettingsTile
            }
            (MethodChannel::QuickSettings, METHOD_REMOVE_QUICK_SETTINGS_TILE) => {
                Self::RemoveQuickSettingsTile
            }
            (MethodChannel::QuickSettings, METHOD_OPEN_QUICK_SETTINGS) => Self::OpenQuickSettings,
            (MethodChannel::BackgroundService, METHOD_START_BACKGROUND_SERVICE) => {
                Self::StartBackgroundService
            }
            (MethodChannel::BackgroundService, METHOD_STOP_BACKGROUND_SERVICE) => {
                Self::StopBackgroundService
            }
            (MethodChannel::Tile, METHOD_CYCLE_BRIGHTNESS) => Self::CycleBrightness,
            (MethodChannel::Tile, METHOD_START_SOS) => Self::StartSos,
            (MethodChannel::Tile, METHOD_STOP_SOS) => Self::StopSos,
            (MethodChannel::Tile, METHOD_TOGGLE_SOS) => Self::ToggleSos {
                locked: args.locked,
            },
            (MethodChannel::Tile, METHOD_ACTIVATE_AMBIENT) => Self::ActivateAmbient,
            _ => return None,
        })
    }

    /// Channel this command belongs to
    pub const fn channel(self) -> MethodChannel {
        match self {
            Self::SetTorch { .. } => MethodChannel::Torch,
            Self::IsQuickTileAdded
            | Self::AddQuickSettingsTile
            | Self::RemoveQuickSettingsTile
            | Self::OpenQuickSettings => MethodChannel::QuickSettings,
            Self::StartBackgroundService | Self::StopBackgroundService => {
                MethodChannel::BackgroundService
            }
            Self::CycleBrightness
            | Self::StartSos
            | Self::StopSos
            | Self::ToggleSos { .. }
            | Self::ActivateAmbient => MethodChannel::Tile,
        }
    }

    /// Method name this command is decoded from
    pub const fn method(self) -> &'static str {
        match self {
            Self::SetTorch { .. } => METHOD_SET_TORCH,
            Self::CycleBrightness => METHOD_CYCLE_BRIGHTNESS,
            Self::StartSos => METHOD_START_SOS,
            Self::StopSos => METHOD_STOP_SOS,
            Self::ToggleSos { .. } => METHOD_TOGGLE_SOS,
            Self::ActivateAmbient => METHOD_ACTIVATE_AMBIENT,
            Self::IsQuickTileAdded => METHOD_IS_QUICK_TILE_ADDED,
            Self::AddQuickSettingsTile => METHOD_ADD_QUICK_SETTINGS_TILE,
            Self::RemoveQuickSettingsTile => METHOD_REMOVE_QUICK_SETTINGS_TILE,
            Self::OpenQuickSettings => METHOD_OPEN_QUICK_SETTINGS,
            Self::StartBackgroundService => METHOD_START_BACKGROUND_SERVICE,
            Self::StopBackgroundService => METHOD_STOP_BACKGROUND_SERVICE,
        }
    }

    /// Whether queuing `self` makes an earlier queued `command` pointless.
    ///
    /// The last requested intensity wins, and so does the last explicit SOS
    /// start or stop.
    pub const fn supersedes(self, command: Self) -> bool {
        matches!(
            (self, command),
            (Self::SetTorch { .. }, Self::SetTorch { .. })
                | (
                    Self::StartSos | Self::StopSos,
                    Self::StartSos | Self::StopSos
                )
        )
    }

    /// Whether `self` undoes `previous` when queued right behind it.
    ///
    /// Two unlocked SOS tile taps leave the player where it was.
    pub const fn cancels(self, previous: Self) -> bool {
        matches!(
            (self, previous),
            (
                Self::ToggleSos { locked: false },
                Self::ToggleSos { locked: false }
            )
        )
    }
}

/// Arguments of a method call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CallArgs {
    /// `intensity` of `setTorch`; missing means `0.0`
    pub intensity: Option<f64>,
    /// Set by the SOS tile when the keyguard is showing
    pub locked: bool,
}

impl CallArgs {
    /// Arguments of a `setTorch` call
    pub const fn with_intensity(intensity: f64) -> Self {
        Self {
            intensity: Some(intensity),
            locked: false,
        }
    }

    /// Arguments of a tile tap on a locked device
    pub const fn while_locked() -> Self {
        Self {
            intensity: None,
            locked: true,
        }
    }
}

/// Screen a tile asks the app to open with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLaunch {
    Ambient,
    Sos,
}

impl AppLaunch {
    /// Launch extra flag carried by the activity intent
    pub const fn extra(self) -> &'static str {
        match self {
            Self::Ambient => EXTRA_ACTIVATE_AMBIENT,
            Self::Sos => EXTRA_ACTIVATE_SOS,
        }
    }

    pub fn from_extra(extra: &str) -> Option<Self> {
        match extra {
            EXTRA_ACTIVATE_AMBIENT => Some(Self::Ambient),
            EXTRA_ACTIVATE_SOS => Some(Self::Sos),
            _ => None,
        }
    }

    /// Shell-bound channel the launch is announced on
    pub const fn channel(self) -> MethodChannel {
        match self {
            Self::Ambient => MethodChannel::Ambient,
            Self::Sos => MethodChannel::Sos,
        }
    }

    /// Method invoked on [`AppLaunch::channel`]
    pub const fn method(self) -> &'static str {
        match self {
            Self::Ambient => METHOD_ACTIVATE_AMBIENT_MODE,
            Self::Sos => METHOD_ACTIVATE_SOS_MODE,
        }
    }
}

/// Successful result of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Unit,
    Bool(bool),
    /// Brightness step selected by a tile tap
    Brightness(BrightnessState),
}
