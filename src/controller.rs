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
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error, info, span, Instrument, Level};

use crate::keyboard::{KeyEvent, KeyboardEvents};
use crate::machine::Mounted;

pub mod keyboard;

/// Controller events that will trigger behavior in the drum machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key press, delivered to every keyboard handler.
    Key(KeyEvent),

    /// A pointer activation of the pad with the given id.
    Pointer(String),

    /// Unmounts the drum machine and stops the controller.
    Quit,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Feeds driver events to a mounted drum machine.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver. The controller owns the mounted
    /// machine and unmounts it when it finishes.
    pub fn new(mounted: Mounted, keyboard: KeyboardEvents, driver: Arc<dyn Driver>) -> Controller {
        let span = span!(Level::INFO, "controller");
        Controller {
            handle: tokio::spawn(
                Controller::trigger_events(mounted, keyboard, driver).instrument(span),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Routes driver events to the keyboard and the machine until the driver quits or
    /// goes away.
    async fn trigger_events(mounted: Mounted, keyboard: KeyboardEvents, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!("Controller started.");
        println!("{}", mounted.machine());

        while let Some(event) = events_rx.recv().await {
            debug!(event = ?event, "Received event.");

            match event {
                Event::Key(key) => {
                    keyboard.dispatch(&key);
                }
                Event::Pointer(pad_id) => {
                    mounted.activate(&pad_id);
                }
                Event::Quit => break,
            }
            println!("{}", mounted.machine());
        }

        info!("Controller closing.");
        drop(events_rx);
        mounted.unmount();

        match join_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(err = e.to_string(), "Event monitor failed"),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
        }
    }
}
