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

//! The drum machine component: pads, the status display and the two trigger paths.

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use crate::audio::{Clip, Device};
use crate::display::DisplayState;
use crate::keyboard::{KeyEvent, KeyboardEvents, Subscription};
use crate::pads::{self, PadError};
use crate::view::{self, Element, CLIP_CLASS, DISPLAY_ID, PAD_CLASS, SRC_ATTR};

#[derive(Debug, thiserror::Error)]
pub enum MachineError {
    #[error("drum machine is already mounted")]
    AlreadyMounted,

    #[error("display placeholder {0:?} is empty or collides with a pad id")]
    InvalidPlaceholder(String),

    #[error("invalid pad registry: {0}")]
    Pads(#[from] PadError),
}

/// A drum machine bound to an audio device.
pub struct DrumMachine {
    display: DisplayState,
    /// The rendered element tree.
    document: RwLock<Element>,
    device: Arc<dyn Device>,
    mounted: AtomicBool,
}

impl DrumMachine {
    /// Creates a drum machine. The placeholder is shown until the first trigger and must
    /// not be mistakable for a pad id.
    pub fn new(device: Arc<dyn Device>, placeholder: &str) -> Result<DrumMachine, MachineError> {
        pads::validate(pads::all())?;
        if placeholder.is_empty() || pads::find_by_id(placeholder).is_some() {
            return Err(MachineError::InvalidPlaceholder(placeholder.to_string()));
        }

        let display = DisplayState::new(placeholder);
        let document = RwLock::new(view::render(pads::all(), &display.get()));
        Ok(DrumMachine {
            display,
            document,
            device,
            mounted: AtomicBool::new(false),
        })
    }

    /// Renders a fresh document, resets the display and attaches the key handler to the
    /// keyboard. The handler stays attached until the returned guard is dropped.
    pub fn mount(self: &Arc<Self>, keyboard: &KeyboardEvents) -> Result<Mounted, MachineError> {
        if self
            .mounted
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MachineError::AlreadyMounted);
        }

        self.display.reset();
        *self.document.write() = view::render(pads::all(), &self.display.get());

        let machine = Arc::downgrade(self);
        let subscription = keyboard.subscribe(move |event| {
            if let Some(machine) = machine.upgrade() {
                machine.handle_key(event);
            }
        });
        info!(device = %self.device, "Drum machine mounted");

        Ok(Mounted {
            machine: self.clone(),
            subscription: Some(subscription),
        })
    }

    /// Handles a pointer activation of a pad element: plays the clip nested under it
    /// and shows the pad's id.
    pub fn handle_pointer(&self, pad: &Element) {
        let Some(pad_id) = pad.id() else {
            error!(tag = pad.tag(), "Activated pad has no id");
            return;
        };
        let Some(clip) = pad.child_by_class(CLIP_CLASS).and_then(clip_of) else {
            error!(pad = pad_id, "No clip found under pad");
            return;
        };

        self.play(&clip);
        self.show_pad(pad_id);
    }

    /// Activates the pad with the given id as if it had been clicked. Returns false if
    /// the document has no such pad.
    pub fn activate(&self, pad_id: &str) -> bool {
        let pad = self
            .document
            .read()
            .find_by_id(pad_id)
            .filter(|element| element.has_class(PAD_CLASS))
            .cloned();

        match pad {
            Some(pad) => {
                self.handle_pointer(&pad);
                true
            }
            None => {
                warn!(pad = pad_id, "No such pad");
                false
            }
        }
    }

    /// Handles a key press: the pad bound to the key (case-insensitive) plays its clip
    /// and shows its id. Keys without a pad are ignored.
    pub fn handle_key(&self, event: &KeyEvent) {
        let Some(pad) = event.normalized().and_then(pads::find_by_key) else {
            debug!(key = event.key(), "Key is not bound to a pad");
            return;
        };

        let key = pad.key_str();
        let clip = self.document.read().find_by_id(&key).and_then(clip_of);
        let Some(clip) = clip else {
            error!(key = %key, pad = pad.id(), "No clip element found for key");
            return;
        };

        self.play(&clip);
        self.show_pad(pad.id());
    }

    /// Decodes every clip in the document ahead of time.
    pub fn preload(&self) -> Result<(), Box<dyn Error>> {
        let clips: Vec<Clip> = self
            .document
            .read()
            .find_all_by_class(CLIP_CLASS)
            .into_iter()
            .filter_map(clip_of)
            .collect();
        info!(clips = clips.len(), "Preloading clips");
        self.device.preload(&clips)
    }

    /// Returns the display text.
    pub fn display(&self) -> String {
        self.display.get()
    }

    /// Returns a snapshot of the rendered document.
    pub fn document(&self) -> Element {
        self.document.read().clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    fn play(&self, clip: &Clip) {
        // A failed play is still an accepted trigger.
        if let Err(e) = self.device.play(clip) {
            error!(clip = clip.id(), err = e.as_ref(), "Unable to play clip");
        }
    }

    fn show_pad(&self, pad_id: &str) {
        self.display.set(pad_id);
        if let Some(display) = self.document.write().find_by_id_mut(DISPLAY_ID) {
            display.set_text(pad_id);
        }
        info!(pad = pad_id, "Pad triggered");
    }
}

impl fmt::Display for DrumMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.document.read())
    }
}

/// The clip an element stands for, if it carries a source.
fn clip_of(element: &Element) -> Option<Clip> {
    Some(Clip::new(element.id()?, element.attribute(SRC_ATTR)?))
}

/// A mounted drum machine. Dropping it detaches the key handler.
pub struct Mounted {
    machine: Arc<DrumMachine>,
    subscription: Option<Subscription>,
}

impl Mounted {
    pub fn machine(&self) -> &Arc<DrumMachine> {
        &self.machine
    }

    /// Activates a pad by id, as a pointer would.
    pub fn activate(&self, pad_id: &str) -> bool {
        self.machine.activate(pad_id)
    }

    pub fn unmount(self) {}
}

impl Drop for Mounted {
    fn drop(&mut self) {
        self.subscription.take();
        self.machine.mounted.store(false, Ordering::Release);
        info!("Drum machine unmounted");
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;

    use super::*;
    use crate::audio::mock;
    use crate::display::DEFAULT_PLACEHOLDER;

    fn machine(device: &mock::Device) -> Result<Arc<DrumMachine>, Box<dyn Error>> {
        Ok(Arc::new(DrumMachine::new(
            Arc::new(device.clone()),
            DEFAULT_PLACEHOLDER,
        )?))
    }

    fn rendered_display(machine: &DrumMachine) -> String {
        machine
            .document()
            .find_by_id(DISPLAY_ID)
            .map(|display| display.text().to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_full_scenario() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;
        let keyboard = KeyboardEvents::new();

        let mounted = machine.mount(&keyboard)?;
        assert_eq!("***", machine.display());

        keyboard.dispatch(&KeyEvent::new("q"));
        assert_eq!("heater-1", machine.display());
        assert_eq!(1, device.played().len());
        assert_eq!(pads::PADS[0].clip(), device.played_srcs()[0]);

        keyboard.dispatch(&KeyEvent::new("Q"));
        assert_eq!("heater-1", machine.display());
        assert_eq!(2, device.played().len());

        keyboard.dispatch(&KeyEvent::new("q"));
        keyboard.dispatch(&KeyEvent::new("w"));
        assert_eq!("heater-2", machine.display());

        assert!(mounted.activate("kick"));
        assert_eq!("kick", machine.display());
        assert_eq!("kick", rendered_display(&machine));
        let played = device.played();
        assert_eq!("X", played[played.len() - 1].id());

        keyboard.dispatch(&KeyEvent::new("p"));
        assert_eq!("kick", machine.display());
        assert_eq!(5, device.played().len());

        mounted.unmount();
        assert_eq!(0, keyboard.dispatch(&KeyEvent::new("q")));
        assert_eq!("kick", machine.display());
        assert_eq!(5, device.played().len());
        Ok(())
    }

    #[test]
    fn test_every_pad_by_key() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;
        let keyboard = KeyboardEvents::new();
        let _mounted = machine.mount(&keyboard)?;

        let mut plays = 0;
        for pad in pads::all() {
            for key in [pad.key().to_ascii_lowercase(), pad.key()] {
                // Show something else first so each press has to update the display.
                machine.show_pad("reset");
                keyboard.dispatch(&KeyEvent::from(key));
                assert_eq!(pad.id(), machine.display());

                let played = device.played();
                plays += 1;
                assert_eq!(plays, played.len());
                assert_eq!(pad.key_str(), played[plays - 1].id());
                assert_eq!(pad.clip(), played[plays - 1].src());
            }
        }
        Ok(())
    }

    #[test]
    fn test_pad_without_id() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;
        machine.activate("heater-2");

        let pad = Element::new("button").with_class(PAD_CLASS).with_child(
            Element::new("audio")
                .with_id("Q")
                .with_class(CLIP_CLASS)
                .with_attribute(SRC_ATTR, pads::PADS[0].clip()),
        );
        machine.handle_pointer(&pad);

        assert_eq!("heater-2", machine.display());
        assert_eq!("heater-2", rendered_display(&machine));
        assert_eq!(1, device.played().len());
        Ok(())
    }

    #[test]
    fn test_every_pad_by_pointer() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;

        for pad in pads::all() {
            assert!(machine.activate(pad.id()));
            assert_eq!(pad.id(), machine.display());
            assert_eq!(pad.id(), rendered_display(&machine));
        }
        assert_eq!(
            pads::all().iter().map(|pad| pad.clip()).collect::<Vec<_>>(),
            device.played_srcs()
        );
        Ok(())
    }

    #[test]
    fn test_retrigger_plays_again() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;

        machine.activate("open-hh");
        machine.activate("open-hh");
        machine.handle_key(&KeyEvent::new("d"));
        assert_eq!(vec![pads::PADS[5].clip(); 3], device.played_srcs());
        Ok(())
    }

    #[test]
    fn test_unknown_inputs_are_ignored() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;

        for key in ["p", "1", " ", "Enter", "ß", ""] {
            machine.handle_key(&KeyEvent::new(key));
        }
        assert!(!machine.activate("snare"));
        assert!(!machine.activate(DISPLAY_ID));
        assert!(!machine.activate("Q"));

        assert_eq!("***", machine.display());
        assert!(device.played().is_empty());
        Ok(())
    }

    #[test]
    fn test_pad_without_clip() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;
        machine.document.write().remove_by_id("Q");

        assert!(machine.activate("heater-1"));
        assert_eq!("***", machine.display());
        assert!(device.played().is_empty());

        // Other pads are unaffected.
        assert!(machine.activate("heater-2"));
        assert_eq!("heater-2", machine.display());
        Ok(())
    }

    #[test]
    fn test_unresolved_key_clip_returns_early() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;
        let keyboard = KeyboardEvents::new();
        let _mounted = machine.mount(&keyboard)?;
        machine.document.write().remove_by_id("Q");

        keyboard.dispatch(&KeyEvent::new("q"));
        assert_eq!("***", machine.display());
        assert!(device.played().is_empty());

        keyboard.dispatch(&KeyEvent::new("e"));
        assert_eq!("heater-3", machine.display());
        assert_eq!(1, device.played().len());
        Ok(())
    }

    #[test]
    fn test_failing_device_still_updates_display() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::failing("broken");
        let machine = machine(&device)?;

        machine.handle_key(&KeyEvent::new("x"));
        assert_eq!("kick", machine.display());
        assert!(machine.activate("closed-hh"));
        assert_eq!("closed-hh", machine.display());
        Ok(())
    }

    #[test]
    fn test_mount_lifecycle() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;
        let keyboard = KeyboardEvents::new();

        let mounted = machine.mount(&keyboard)?;
        assert!(machine.is_mounted());
        assert!(matches!(
            machine.mount(&keyboard),
            Err(MachineError::AlreadyMounted)
        ));
        assert_eq!(1, keyboard.subscriber_count());

        keyboard.dispatch(&KeyEvent::new("z"));
        assert_eq!("kick-n-hh", machine.display());

        drop(mounted);
        assert!(!machine.is_mounted());
        assert_eq!(0, keyboard.subscriber_count());

        // Remounting starts from a fresh display and document.
        let mounted = machine.mount(&keyboard)?;
        assert_eq!("***", machine.display());
        assert_eq!("***", rendered_display(&machine));
        assert!(Arc::ptr_eq(&machine, mounted.machine()));
        Ok(())
    }

    #[test]
    fn test_placeholder() -> Result<(), Box<dyn Error>> {
        let device: Arc<dyn Device> = Arc::new(mock::Device::get("mock"));

        let machine = DrumMachine::new(device.clone(), "ready")?;
        assert_eq!("ready", machine.display());
        assert_eq!("ready", rendered_display(&machine));
        assert!(machine.to_string().contains("ready"));

        assert!(matches!(
            DrumMachine::new(device.clone(), "heater-4"),
            Err(MachineError::InvalidPlaceholder(_))
        ));
        assert!(matches!(
            DrumMachine::new(device, ""),
            Err(MachineError::InvalidPlaceholder(_))
        ));
        Ok(())
    }

    #[test]
    fn test_preload() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock");
        let machine = machine(&device)?;
        machine.preload()?;
        assert!(device.played().is_empty());
        Ok(())
    }
}
