//! Per-pin registry of change listeners.
use std::sync::Arc;

use crate::{Pin, PinState};

/// A change detected on a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Digital { pin: Pin, state: PinState },
    Analog { pin: Pin, value: u16 },
}

impl PinEvent {
    pub fn pin(&self) -> Pin {
        match *self {
            PinEvent::Digital { pin, .. } | PinEvent::Analog { pin, .. } => pin,
        }
    }
}

/// Receiver of [`PinEvent`]s.
///
/// Listeners are called from the monitor thread as well as from whichever thread changed an
/// output, never with a lock of the provider held.  A listener may therefore call back into the
/// provider, including removing itself.
pub trait PinListener: Send + Sync {
    fn on_event(&self, event: PinEvent);
}

impl<F> PinListener for F
where
    F: Fn(PinEvent) + Send + Sync,
{
    fn on_event(&self, event: PinEvent) {
        self(event)
    }
}

/// Handle returned when registering a listener, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Pin, Arc<dyn PinListener>)>,
}

impl Listeners {
    pub fn add(&mut self, pin: Pin, listener: Arc<dyn PinListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, pin, listener));
        id
    }

    /// Returns whether `id` was registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, ..)| *entry != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Listeners registered for `pin`, in registration order.
    pub fn for_pin(&self, pin: Pin) -> Vec<Arc<dyn PinListener>> {
        self.entries
            .iter()
            .filter(|(_, p, _)| *p == pin)
            .map(|(_, _, listener)| listener.clone())
            .collect()
    }
}
