// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! The process-wide keyboard event source.
//!
//! Handlers are attached with [`KeyboardEvents::subscribe`] and stay attached
//! for as long as the returned [`Subscription`] is alive.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

/// A key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    key: String,
}

impl KeyEvent {
    /// Creates a key event for the given key string (e.g. "q", "Q", "Enter").
    pub fn new(key: &str) -> KeyEvent {
        KeyEvent {
            key: key.to_string(),
        }
    }

    /// Returns the raw key string.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the key as a single uppercase character, if it is one.
    pub fn normalized(&self) -> Option<char> {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                let mut upper = c.to_uppercase();
                match (upper.next(), upper.next()) {
                    (Some(u), None) => Some(u),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

impl From<char> for KeyEvent {
    fn from(c: char) -> Self {
        KeyEvent { key: c.to_string() }
    }
}

type Handler = Arc<dyn Fn(&KeyEvent) + Send + Sync>;

type Handlers = RwLock<Vec<(u64, Handler)>>;

/// The keyboard event source. Clones share the same subscribers.
#[derive(Clone, Default)]
pub struct KeyboardEvents {
    handlers: Arc<Handlers>,
    next_id: Arc<AtomicU64>,
}

impl KeyboardEvents {
    pub fn new() -> KeyboardEvents {
        KeyboardEvents::default()
    }

    /// Attaches a handler. It is detached when the returned subscription is dropped.
    #[must_use = "the handler is detached as soon as the subscription is dropped"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&KeyEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().push((id, Arc::new(handler)));
        debug!(subscription = id, "Keyboard handler attached");

        Subscription {
            id,
            handlers: Arc::downgrade(&self.handlers),
        }
    }

    /// Delivers the event to every attached handler, in attachment order.
    /// Returns the number of handlers that received it.
    ///
    /// Handlers attached when the dispatch starts all receive the event, even if their
    /// subscription is dropped before their turn. Detaching only affects later dispatches.
    pub fn dispatch(&self, event: &KeyEvent) -> usize {
        // Handlers may subscribe or unsubscribe, so don't hold the lock while calling them.
        let handlers: Vec<Handler> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers.iter() {
            handler(event);
        }
        handlers.len()
    }

    /// Returns the number of attached handlers.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl fmt::Debug for KeyboardEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyboardEvents")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Keeps a keyboard handler attached.
pub struct Subscription {
    id: u64,
    handlers: Weak<Handlers>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handlers) = self.handlers.upgrade() {
            handlers.write().retain(|(id, _)| *id != self.id);
            debug!(subscription = self.id, "Keyboard handler detached");
        }
    }
}
