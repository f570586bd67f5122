//! SOS playback on a dedicated worker thread.

use core::cell::Cell;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use critical_section::Mutex;
use embassy_time::{Duration, Instant};
use log::{debug, error, info};

use super::{SosSequence, SosTimings};
use crate::error::{HardwareFault, TorchError};
use crate::torch::{TorchController, TorchDevice};

/// Name given to the worker thread.
const WORKER_NAME: &str = "dimly-sos";

/// Playback phase shared between the caller and the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Playing,
    /// `stop()` was called and the worker has not reached a phase boundary yet
    CancelRequested,
    /// The worker is switching off. With `restart` it plays the sequence again
    Ending { restart: bool },
}

type SharedPhase = Arc<Mutex<Cell<Phase>>>;

/// How a playback ended without a hardware fault
#[derive(Debug, Clone, Copy)]
enum Completion {
    Finished,
    Cancelled,
}

/// SOS player - `Idle -> Playing -> Idle`
///
/// At most one worker runs at a time. Cancellation is cooperative: the worker
/// checks for a stop before every light phase, so a phase that already started
/// always runs to the end of its hold. A `start()` that arrives before the
/// worker acted on a `stop()` withdraws the cancel; one that arrives while the
/// worker is switching off makes it play the sequence again.
pub struct SosPlayer<D: TorchDevice + Send + 'static> {
    torch: Arc<TorchController<D>>,
    sequence: SosSequence,
    phase: SharedPhase,
    worker: Option<JoinHandle<()>>,
}

impl<D: TorchDevice + Send + 'static> SosPlayer<D> {
    pub fn new(torch: Arc<TorchController<D>>, timings: &SosTimings) -> Self {
        Self {
            torch,
            sequence: SosSequence::new(timings),
            phase: Arc::new(Mutex::new(Cell::new(Phase::Idle))),
            worker: None,
        }
    }

    pub fn sequence(&self) -> &SosSequence {
        &self.sequence
    }

    /// Returns true until the worker has exited
    pub fn is_playing(&self) -> bool {
        self.phase() != Phase::Idle
    }

    /// Start the pattern and return immediately.
    ///
    /// Does nothing if a sequence is already running. A pending stop is
    /// withdrawn instead.
    pub fn start(&mut self) -> Result<(), TorchError> {
        if !self.torch.is_available() {
            return Err(TorchError::Unavailable);
        }

        let previous = critical_section::with(|cs| {
            let cell = self.phase.borrow(cs);
            let previous = cell.get();
            cell.set(match previous {
                Phase::Ending { .. } => Phase::Ending { restart: true },
                Phase::Idle | Phase::Playing | Phase::CancelRequested => Phase::Playing,
            });
            previous
        });
        match previous {
            Phase::Idle => {}
            Phase::Playing => {
                debug!("[SosPlayer.start] already playing");
                return Ok(());
            }
            Phase::CancelRequested => {
                debug!("[SosPlayer.start] pending stop withdrawn");
                return Ok(());
            }
            Phase::Ending { .. } => {
                debug!("[SosPlayer.start] replay after the current run");
                return Ok(());
            }
        }

        // The previous worker has set `Idle`, it is about to exit
        self.reap();

        let torch = Arc::clone(&self.torch);
        let phase = Arc::clone(&self.phase);
        let sequence = self.sequence.clone();
        let spawned = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || play(&torch, &phase, &sequence));

        match spawned {
            Ok(worker) => {
                info!("[SosPlayer.start] playing SOS");
                self.worker = Some(worker);
                Ok(())
            }
            Err(err) => {
                reset(&self.phase);
                error!("[SosPlayer.start] could not spawn worker: {}", err);
                Err(HardwareFault::new(&err.to_string()).into())
            }
        }
    }

    /// Request cancellation without waiting for the worker
    pub fn stop(&self) {
        critical_section::with(|cs| {
            let cell = self.phase.borrow(cs);
            match cell.get() {
                Phase::Playing => cell.set(Phase::CancelRequested),
                Phase::Ending { restart: true } => cell.set(Phase::Ending { restart: false }),
                Phase::Idle | Phase::CancelRequested | Phase::Ending { restart: false } => {}
            }
        });
    }

    /// Stop when running, start otherwise. Returns whether the pattern will play.
    ///
    /// A run that is already being cancelled or switched off counts as
    /// stopped, so a quick off-on double tap resumes the pattern.
    pub fn toggle(&mut self) -> Result<bool, TorchError> {
        match self.phase() {
            Phase::Playing | Phase::Ending { restart: true } => {
                self.stop();
                Ok(false)
            }
            Phase::Idle | Phase::CancelRequested | Phase::Ending { restart: false } => {
                self.start()?;
                Ok(true)
            }
        }
    }

    /// Block until the current worker, if any, has exited
    pub fn wait(&mut self) {
        self.reap();
    }

    fn phase(&self) -> Phase {
        critical_section::with(|cs| self.phase.borrow(cs).get())
    }

    fn reap(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("[SosPlayer] worker panicked");
                reset(&self.phase);
            }
        }
    }
}

impl<D: TorchDevice + Send + 'static> Drop for SosPlayer<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn reset(phase: &Mutex<Cell<Phase>>) {
    critical_section::with(|cs| phase.borrow(cs).set(Phase::Idle));
}

/// Act on a pending stop. The check and the switch to `Ending` are one step,
/// so a later `start()` is never lost.
fn claim_cancel(phase: &Mutex<Cell<Phase>>) -> bool {
    critical_section::with(|cs| {
        let cell = phase.borrow(cs);
        if cell.get() == Phase::CancelRequested {
            cell.set(Phase::Ending { restart: false });
            true
        } else {
            false
        }
    })
}

/// The last step has played
fn begin_ending(phase: &Mutex<Cell<Phase>>) {
    critical_section::with(|cs| {
        let cell = phase.borrow(cs);
        if matches!(cell.get(), Phase::Playing | Phase::CancelRequested) {
            cell.set(Phase::Ending { restart: false });
        }
    });
}

/// Leave `Ending`. Returns true when a replay was requested meanwhile.
fn finish(phase: &Mutex<Cell<Phase>>) -> bool {
    critical_section::with(|cs| {
        let cell = phase.borrow(cs);
        let replay = cell.get() == (Phase::Ending { restart: true });
        cell.set(if replay { Phase::Playing } else { Phase::Idle });
        replay
    })
}

/// Worker body. Hardware faults abandon the sequence and are only logged.
fn play<D: TorchDevice>(
    torch: &TorchController<D>,
    phase: &Mutex<Cell<Phase>>,
    sequence: &SosSequence,
) {
    loop {
        let started = Instant::now();
        match play_steps(torch, phase, sequence) {
            Ok(Completion::Finished) => {
                info!(
                    "[SosPlayer] finished after {} ms",
                    started.elapsed().as_millis()
                );
            }
            Ok(Completion::Cancelled) => {
                info!(
                    "[SosPlayer] cancelled after {} ms",
                    started.elapsed().as_millis()
                );
            }
            Err(err) => {
                error!("[SosPlayer] abandoned: {}", err);
                if let Err(err) = torch.turn_off() {
                    debug!("[SosPlayer] could not switch torch off: {}", err);
                }
                reset(phase);
                return;
            }
        }
        if !finish(phase) {
            return;
        }
        info!("[SosPlayer] playing SOS again");
    }
}

fn play_steps<D: TorchDevice>(
    torch: &TorchController<D>,
    phase: &Mutex<Cell<Phase>>,
    sequence: &SosSequence,
) -> Result<Completion, TorchError> {
    let mut lit = None;
    for step in sequence.steps() {
        if claim_cancel(phase) {
            torch.turn_off()?;
            return Ok(Completion::Cancelled);
        }
        if lit != Some(step.lit) {
            torch.set_on(step.lit)?;
            lit = Some(step.lit);
        }
        hold(step.hold);
    }
    begin_ending(phase);
    torch.turn_off()?;
    Ok(Completion::Finished)
}

fn hold(duration: Duration) {
    thread::sleep(core::time::Duration::from_micros(duration.as_micros()));
}
