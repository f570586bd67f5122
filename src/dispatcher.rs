//! Command dispatcher - the single owner of torch, tile and SOS state
//!
//! The host creates one [`Dispatcher`] and routes every method-channel call
//! and tile tap into it, either directly with [`Dispatcher::dispatch`] or
//! through a [`CommandQueue`](crate::CommandQueue) drained by
//! [`Dispatcher::process_pending`].

use std::sync::Arc;

use log::{debug, info, warn};

use crate::command::{AppLaunch, CallArgs, Command, MethodChannel, Reply};
use crate::error::{DispatchError, ShellError};
use crate::queue::CommandReceiver;
use crate::sos::{SosPlayer, SosTimings};
use crate::store::KeyValueStore;
use crate::tile::{BRIGHTNESS_KEY, FlashlightTile, TileView};
use crate::torch::{TorchController, TorchDevice};

/// Platform operations that stay outside the crate
pub trait HostShell {
    /// Show the Quick Settings panel
    fn open_quick_settings(&mut self) -> Result<(), ShellError>;

    /// Open the system settings app
    fn open_settings(&mut self) -> Result<(), ShellError>;

    /// Start the foreground service that keeps the tiles responsive
    fn start_background_service(&mut self) -> Result<(), ShellError>;

    fn stop_background_service(&mut self) -> Result<(), ShellError>;

    /// Bring the app to the front with the launch extra set, unlocking the
    /// device first if needed
    fn open_app(&mut self, launch: AppLaunch) -> Result<(), ShellError>;

    /// Invoke `launch.method()` on `launch.channel()` in the application shell
    fn announce_launch(&mut self, launch: AppLaunch) -> Result<(), ShellError>;
}

/// Configuration for the dispatcher
#[derive(Debug, Clone)]
pub struct DimlyConfig {
    pub sos: SosTimings,
    /// Preference key of the flashlight tile selection
    pub brightness_key: &'static str,
}

impl Default for DimlyConfig {
    fn default() -> Self {
        Self {
            sos: SosTimings::DEFAULT,
            brightness_key: BRIGHTNESS_KEY,
        }
    }
}

/// Dispatcher - routes commands to their handlers
pub struct Dispatcher<D, S, H>
where
    D: TorchDevice + Send + 'static,
    S: KeyValueStore,
    H: HostShell,
{
    torch: Arc<TorchController<D>>,
    tile: FlashlightTile<D, S>,
    sos: SosPlayer<D>,
    host: H,
}

impl<D, S, H> Dispatcher<D, S, H>
where
    D: TorchDevice + Send + 'static,
    S: KeyValueStore,
    H: HostShell,
{
    pub fn new(device: D, store: S, host: H, config: &DimlyConfig) -> Self {
        let torch = Arc::new(TorchController::new(device));
        Self {
            tile: FlashlightTile::with_key(Arc::clone(&torch), store, config.brightness_key),
            sos: SosPlayer::new(Arc::clone(&torch), &config.sos),
            torch,
            host,
        }
    }

    /// Decode and run a raw method call
    pub fn handle(
        &mut self,
        channel: &str,
        method: &str,
        args: CallArgs,
    ) -> Result<Reply, DispatchError> {
        let command = MethodChannel::parse_from_str(channel)
            .and_then(|channel| Command::parse(channel, method, args));
        let Some(command) = command else {
            debug!("[Dispatcher.handle] {}#{} not implemented", channel, method);
            return Err(DispatchError::NotImplemented);
        };
        self.dispatch(command)
    }

    /// Run one command
    pub fn dispatch(&mut self, command: Command) -> Result<Reply, DispatchError> {
        debug!("[Dispatcher.dispatch] {:?}", command);
        match command {
            Command::SetTorch { intensity } => {
                self.torch.set_intensity(intensity)?;
                Ok(Reply::Unit)
            }
            Command::CycleBrightness => {
                let activation = self.tile.activate();
                activation.torch?;
                Ok(Reply::Brightness(activation.state))
            }
            Command::StartSos => {
                self.sos.start()?;
                Ok(Reply::Bool(self.sos.is_playing()))
            }
            Command::StopSos => {
                self.sos.stop();
                Ok(Reply::Bool(false))
            }
            Command::ToggleSos { locked: false } => {
                self.ensure_background_service();
                Ok(Reply::Bool(self.sos.toggle()?))
            }
            // The app decides once the user has unlocked
            Command::ToggleSos { locked: true } => {
                self.ensure_background_service();
                self.open_app(AppLaunch::Sos);
                Ok(Reply::Bool(self.sos.is_playing()))
            }
            Command::ActivateAmbient => {
                self.ensure_background_service();
                Ok(Reply::Bool(self.open_app(AppLaunch::Ambient)))
            }
            // Tiles are declared in the manifest, the user adds them manually
            Command::IsQuickTileAdded
            | Command::AddQuickSettingsTile
            | Command::RemoveQuickSettingsTile => Ok(Reply::Bool(true)),
            Command::OpenQuickSettings => self.open_quick_settings(),
            Command::StartBackgroundService => {
                Ok(Reply::Bool(self.ensure_background_service()))
            }
            Command::StopBackgroundService => Ok(Reply::Bool(self.stop_background_service())),
        }
    }

    /// Run every queued command (non-blocking)
    ///
    /// `on_reply` receives each command with its result. Returns the number
    /// of commands processed.
    pub fn process_pending<const SIZE: usize>(
        &mut self,
        commands: CommandReceiver<'_, SIZE>,
        mut on_reply: impl FnMut(Command, Result<Reply, DispatchError>),
    ) -> usize {
        let mut processed = 0;
        while let Ok(command) = commands.try_receive() {
            let result = self.dispatch(command);
            on_reply(command, result);
            processed += 1;
        }
        processed
    }

    /// Forward the launch extras the app was opened with to the shell.
    ///
    /// Each screen is announced at most once, ambient first. Returns the
    /// launches that reached the shell.
    pub fn handle_launch_extras(&mut self, extras: &[&str]) -> usize {
        let mut announced = 0;
        for launch in [AppLaunch::Ambient, AppLaunch::Sos] {
            if !extras.iter().any(|extra| AppLaunch::from_extra(extra) == Some(launch)) {
                continue;
            }
            match self.host.announce_launch(launch) {
                Ok(()) => {
                    debug!(
                        "[Dispatcher] {}#{} sent",
                        launch.channel().as_str(),
                        launch.method()
                    );
                    announced += 1;
                }
                Err(err) => warn!("[Dispatcher] could not announce {:?}: {}", launch, err),
            }
        }
        announced
    }

    /// Cancel SOS, wait for the worker and switch the torch off
    pub fn shutdown(&mut self) {
        self.sos.stop();
        self.sos.wait();
        if let Err(err) = self.torch.turn_off() {
            warn!("[Dispatcher.shutdown] could not switch torch off: {}", err);
        }
    }

    pub fn torch(&self) -> &TorchController<D> {
        &self.torch
    }

    pub fn flashlight_tile(&self) -> &FlashlightTile<D, S> {
        &self.tile
    }

    pub fn sos(&mut self) -> &mut SosPlayer<D> {
        &mut self.sos
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn sos_tile_view(&self) -> TileView {
        TileView::sos(self.sos.is_playing())
    }

    fn open_quick_settings(&mut self) -> Result<Reply, DispatchError> {
        let Err(err) = self.host.open_quick_settings() else {
            return Ok(Reply::Bool(true));
        };
        debug!("[Dispatcher] quick settings panel unavailable: {}", err);
        self.host
            .open_settings()
            .map(|()| Reply::Bool(true))
            .map_err(DispatchError::OpenSettings)
    }

    fn open_app(&mut self, launch: AppLaunch) -> bool {
        match self.host.open_app(launch) {
            Ok(()) => true,
            Err(err) => {
                warn!("[Dispatcher] could not open app for {:?}: {}", launch, err);
                false
            }
        }
    }

    fn ensure_background_service(&mut self) -> bool {
        match self.host.start_background_service() {
            Ok(()) => {
                info!("[Dispatcher] background service started");
                true
            }
            Err(err) => {
                warn!("[Dispatcher] could not start background service: {}", err);
                false
            }
        }
    }

    /// Stopping the service also releases the torch
    fn stop_background_service(&mut self) -> bool {
        let stopped = match self.host.stop_background_service() {
            Ok(()) => true,
            Err(err) => {
                warn!("[Dispatcher] could not stop background service: {}", err);
                false
            }
        };
        if let Err(err) = self.torch.turn_off() {
            warn!("[Dispatcher] could not switch torch off: {}", err);
        }
        stopped
    }
}
