//! Pending tile taps and shell calls, waiting for the dispatcher.
//!
//! Tile services may run on other threads than the one that owns the
//! [`Dispatcher`](crate::Dispatcher). They push commands through a
//! [`CommandSender`]; the dispatcher drains them with a [`CommandReceiver`].
//!
//! The queue keeps only commands that still matter. A newer `SetTorch`
//! replaces a queued one, an explicit SOS start or stop replaces the queued
//! start or stop it overrides, and two unlocked SOS tile taps in a row undo
//! each other.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

use crate::command::Command;

/// Error returned when the queue is full. Carries the rejected command back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrySendError(pub Command);

/// Error returned when the queue is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TryReceiveError;

/// What happened to a command handed to [`CommandQueue::try_send`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Queued {
    /// Appended behind the pending commands
    Appended,
    /// Appended after dropping this many pending commands it overrides
    Replaced(usize),
    /// Undid the previous pending command; neither will run
    Cancelled,
}

/// Bounded, thread-safe queue of pending [`Command`]s.
pub struct CommandQueue<const SIZE: usize> {
    inner: Mutex<RefCell<Deque<Command, SIZE>>>,
}

impl<const SIZE: usize> CommandQueue<SIZE> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Handle for trigger sources. Any number may coexist.
    pub const fn sender(&self) -> CommandSender<'_, SIZE> {
        CommandSender { queue: self }
    }

    /// Handle for the dispatcher.
    pub const fn receiver(&self) -> CommandReceiver<'_, SIZE> {
        CommandReceiver { queue: self }
    }

    /// Queue a command, merging it with the pending ones.
    ///
    /// Hands the command back if it still needs a slot and none is free.
    pub fn try_send(&self, command: Command) -> Result<Queued, TrySendError> {
        critical_section::with(|cs| {
            let mut pending = self.inner.borrow(cs).borrow_mut();

            if pending.back().is_some_and(|previous| command.cancels(*previous)) {
                pending.pop_back();
                return Ok(Queued::Cancelled);
            }

            let replaced = remove_superseded(&mut pending, command);
            pending.push_back(command).map_err(TrySendError)?;
            Ok(match replaced {
                0 => Queued::Appended,
                n => Queued::Replaced(n),
            })
        })
    }

    /// Take the oldest pending command
    pub fn try_receive(&self) -> Result<Command, TryReceiveError> {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .borrow_mut()
                .pop_front()
                .ok_or(TryReceiveError)
        })
    }

    /// Number of pending commands
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<const SIZE: usize> Default for CommandQueue<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop the pending commands `command` overrides, keeping the order of the
/// rest. Returns how many were dropped.
fn remove_superseded<const SIZE: usize>(
    pending: &mut Deque<Command, SIZE>,
    command: Command,
) -> usize {
    let before = pending.len();
    for _ in 0..before {
        let Some(queued) = pending.pop_front() else {
            break;
        };
        if !command.supersedes(queued) {
            // The slot was freed by the pop above
            let _ = pending.push_back(queued);
        }
    }
    before - pending.len()
}

/// Sending half of a [`CommandQueue`].
#[derive(Clone, Copy)]
pub struct CommandSender<'a, const SIZE: usize> {
    queue: &'a CommandQueue<SIZE>,
}

impl<const SIZE: usize> CommandSender<'_, SIZE> {
    pub fn try_send(&self, command: Command) -> Result<Queued, TrySendError> {
        self.queue.try_send(command)
    }
}

/// Receiving half of a [`CommandQueue`].
#[derive(Clone, Copy)]
pub struct CommandReceiver<'a, const SIZE: usize> {
    queue: &'a CommandQueue<SIZE>,
}

impl<const SIZE: usize> CommandReceiver<'_, SIZE> {
    pub fn try_receive(&self) -> Result<Command, TryReceiveError> {
        self.queue.try_receive()
    }
}
