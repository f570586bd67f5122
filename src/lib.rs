//! Torch control core for the Dimly flashlight
//!
//! The host binds its camera API through [`TorchDevice`], its preference
//! storage through [`KeyValueStore`] and its activity/service plumbing
//! through [`HostShell`]. Everything else lives here: intensity mapping,
//! the brightness tile cycle and the SOS blink pattern.

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod queue;
pub mod sos;
pub mod store;
pub mod tile;
pub mod torch;

pub use command::{AppLaunch, CallArgs, Command, MethodChannel, Reply};
pub use dispatcher::{DimlyConfig, Dispatcher, HostShell};
pub use error::{DispatchError, HardwareFault, ShellError, StoreError, TorchError};
pub use queue::{CommandQueue, CommandReceiver, CommandSender, Queued};
pub use sos::{SosPlayer, SosSequence, SosStep, SosTimings};
pub use store::{KeyValueStore, MemoryStore};
pub use tile::{
    Activation, BRIGHTNESS_LEVELS, BrightnessState, FlashlightTile, TileState, TileView,
};
pub use torch::{TorchCapability, TorchCommand, TorchController, TorchDevice};

pub use embassy_time::{Duration, Instant};

/// Initialize platform logging.
///
/// Installs the Android logger on Android. Elsewhere the host chooses its
/// own `log` backend and this does nothing.
pub fn init() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("DimlyTorch"),
        );
        log::info!("Dimly torch core initialized");
    }
}
