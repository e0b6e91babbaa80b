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

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, info, span, Level};

use super::Event;
use crate::keyboard::KeyEvent;

const CLICK: &str = "click";
const QUIT: &str = "quit";

/// A driver that reads pad keys and commands from the terminal, one line at a time.
#[derive(Default)]
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Reads one line and sends its events. Returns false once input is over.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(writer, "Keys, {} <pad> or {}: ", CLICK, QUIT)?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            info!("Input closed");
            return Ok(false);
        }

        for event in parse_line(&input) {
            let quit = event == Event::Quit;
            events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            if quit {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Turns a line of input into events. Anything that isn't a command is typed: one key
/// event per character, whitespace skipped.
fn parse_line(line: &str) -> Vec<Event> {
    let line = line.trim();
    if line.eq_ignore_ascii_case(QUIT) {
        return vec![Event::Quit];
    }

    if let Some((command, pad)) = line.split_once(char::is_whitespace) {
        if command.eq_ignore_ascii_case(CLICK) {
            return vec![Event::Pointer(pad.trim().to_string())];
        }
    }

    let events: Vec<Event> = line
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| Event::Key(KeyEvent::from(c)))
        .collect();
    debug!(keys = events.len(), "Typed keys");
    events
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}
            Ok(())
        })
    }
}
