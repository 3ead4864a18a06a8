//! Completion routing from interrupt context to channel objects
//!
//! Chip HALs report completion per hardware handle (peripheral instance).
//! The registry is a bounded arena mapping each handle to the channel that
//! owns it. Entries are added by [`CompletionRegistry::attach`] and removed
//! when the returned [`Registration`] drops; the guard aborts in-flight
//! transfers first, so no event is routed to a channel that is going away.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use heapless::Vec;

/// Identifier of a hardware peripheral instance (e.g. USART2 -> 2)
pub type HandleId = u8;

/// Completion events raised from interrupt context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CompletionEvent {
    /// Transmit finished
    TxComplete,
    /// Receive finished
    RxComplete,
    /// Full-duplex transfer finished
    TxRxComplete,
    /// Continuous reception wrote up to `head` bytes into the ring buffer
    RxEvent { head: usize },
    /// The peripheral reported an error
    Error,
    /// An abort request finished
    AbortComplete,
}

/// Receiver of routed completion events
pub trait CompletionHandler {
    /// Handle an event for this channel. Called from interrupt context.
    fn on_event(&self, event: CompletionEvent);

    /// Abort any transfer in flight. Called before deregistration.
    fn shutdown(&self);
}

/// Errors from registry operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Every slot is in use
    Full,
    /// The handle already has a registered channel
    AlreadyRegistered,
}

struct Slot<'a> {
    handle: HandleId,
    target: &'a (dyn CompletionHandler + Sync),
}

/// Bounded handle -> channel routing table
pub struct CompletionRegistry<'a, const N: usize> {
    slots: Mutex<CriticalSectionRawMutex, RefCell<Vec<Slot<'a>, N>>>,
}

impl<'a, const N: usize> Default for CompletionRegistry<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> CompletionRegistry<'a, N> {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Vec::new())),
        }
    }

    /// Route events for `handle` to `target` until the registration drops
    pub fn attach(
        &self,
        handle: HandleId,
        target: &'a (dyn CompletionHandler + Sync),
    ) -> Result<Registration<'_, 'a, N>, RegistryError> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            if index_of(&slots, handle).is_some() {
                return Err(RegistryError::AlreadyRegistered);
            }
            slots
                .push(Slot { handle, target })
                .map_err(|_| RegistryError::Full)
        })?;

        abspos_hal::debug!("registered completion handle {=u8}", handle);

        Ok(Registration {
            registry: self,
            handle,
            target,
        })
    }

    /// Deliver `event` to the channel registered for `handle`
    ///
    /// Returns `false` if no channel is registered, in which case the event
    /// is dropped.
    pub fn dispatch(&self, handle: HandleId, event: CompletionEvent) -> bool {
        let target = self.slots.lock(|slots| {
            let slots = slots.borrow();
            index_of(&slots, handle).map(|index| slots[index].target)
        });

        match target {
            Some(target) => {
                target.on_event(event);
                true
            }
            None => false,
        }
    }

    /// Check whether `handle` has a registered channel
    pub fn is_registered(&self, handle: HandleId) -> bool {
        self.slots
            .lock(|slots| index_of(&slots.borrow(), handle).is_some())
    }

    /// Number of registered channels
    pub fn len(&self) -> usize {
        self.slots.lock(|slots| slots.borrow().len())
    }

    /// Check whether no channel is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn detach(&self, handle: HandleId) {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            if let Some(index) = index_of(&slots, handle) {
                slots.swap_remove(index);
            }
        });
    }
}

fn index_of<const N: usize>(slots: &Vec<Slot<'_>, N>, handle: HandleId) -> Option<usize> {
    slots.iter().position(|slot| slot.handle == handle)
}

/// Guard keeping a channel registered
///
/// Dropping it aborts the channel's in-flight transfer, then removes the
/// routing entry.
pub struct Registration<'r, 'a, const N: usize> {
    registry: &'r CompletionRegistry<'a, N>,
    handle: HandleId,
    target: &'a (dyn CompletionHandler + Sync),
}

impl<const N: usize> Registration<'_, '_, N> {
    /// The handle this registration routes
    pub fn handle(&self) -> HandleId {
        self.handle
    }
}

impl<const N: usize> Drop for Registration<'_, '_, N> {
    fn drop(&mut self) {
        self.target.shutdown();
        self.registry.detach(self.handle);
        abspos_hal::debug!("deregistered completion handle {=u8}", self.handle);
    }
}
