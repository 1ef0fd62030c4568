//! Global key listener for platforms without registered hotkeys.
//!
//! rdev reports raw presses and releases; modifiers are tracked here and
//! every complete chord found in the binding table is queued as a command.

use rdev::{listen, Event, EventType, Key as RawKey};
use std::sync::mpsc::Sender;
use std::thread;
use stealth_overlay_core::command::Command;
use stealth_overlay_core::hotkey::{HotkeyDispatcher, Key, Modifiers};

#[derive(Default)]
struct Held {
    ctrl: bool,
    alt: bool,
    shift: bool,
}

impl Held {
    fn modifiers(&self) -> Modifiers {
        let mut modifiers = Modifiers::NONE;
        if self.ctrl {
            modifiers = modifiers | Modifiers::CONTROL;
        }
        if self.alt {
            modifiers = modifiers | Modifiers::ALT;
        }
        if self.shift {
            modifiers = modifiers | Modifiers::SHIFT;
        }
        modifiers
    }
}

fn map_key(key: RawKey) -> Option<Key> {
    Some(match key {
        RawKey::KeyB => Key::B,
        RawKey::KeyD => Key::D,
        RawKey::KeyH => Key::H,
        RawKey::KeyQ => Key::Q,
        RawKey::KeyS => Key::S,
        RawKey::KeyT => Key::T,
        RawKey::Space => Key::Space,
        RawKey::UpArrow => Key::Up,
        RawKey::DownArrow => Key::Down,
        RawKey::LeftArrow => Key::Left,
        RawKey::RightArrow => Key::Right,
        _ => return None,
    })
}

/// Turns raw key events into commands.
#[derive(Default)]
pub struct ChordTracker {
    held: Held,
    dispatcher: HotkeyDispatcher,
}

impl ChordTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&mut self, event: &EventType) -> Option<Command> {
        match *event {
            EventType::KeyPress(key) => match key {
                RawKey::ControlLeft | RawKey::ControlRight => self.held.ctrl = true,
                RawKey::Alt | RawKey::AltGr => self.held.alt = true,
                RawKey::ShiftLeft | RawKey::ShiftRight => self.held.shift = true,
                other => {
                    let key = map_key(other)?;
                    return self.dispatcher.command_for_chord(self.held.modifiers(), key);
                }
            },
            EventType::KeyRelease(key) => match key {
                RawKey::ControlLeft | RawKey::ControlRight => self.held.ctrl = false,
                RawKey::Alt | RawKey::AltGr => self.held.alt = false,
                RawKey::ShiftLeft | RawKey::ShiftRight => self.held.shift = false,
                _ => {}
            },
            _ => {}
        }
        None
    }
}

/// Starts the listener thread. It lives until the process exits.
pub fn spawn_listener(commands: Sender<Command>) {
    thread::spawn(move || {
        let mut tracker = ChordTracker::new();
        let callback = move |event: Event| {
            if let Some(command) = tracker.on_event(&event.event_type) {
                let _ = commands.send(command);
            }
        };
        if let Err(e) = listen(callback) {
            log::error!("Key listener stopped: {:?}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use stealth_overlay_core::command::Direction;

    fn press(tracker: &mut ChordTracker, key: RawKey) -> Option<Command> {
        tracker.on_event(&EventType::KeyPress(key))
    }

    #[test]
    fn chord_needs_its_exact_modifiers() {
        let mut tracker = ChordTracker::new();
        assert_eq!(press(&mut tracker, RawKey::KeyH), None);

        press(&mut tracker, RawKey::ControlLeft);
        assert_eq!(press(&mut tracker, RawKey::KeyH), Some(Command::Capture));

        press(&mut tracker, RawKey::Alt);
        assert_eq!(press(&mut tracker, RawKey::KeyH), None);
        assert_eq!(
            press(&mut tracker, RawKey::UpArrow),
            Some(Command::Move(Direction::Up))
        );
    }

    #[test]
    fn releasing_a_modifier_drops_it() {
        let mut tracker = ChordTracker::new();
        press(&mut tracker, RawKey::ControlRight);
        press(&mut tracker, RawKey::ShiftLeft);
        assert_eq!(press(&mut tracker, RawKey::KeyQ), Some(Command::Quit));

        tracker.on_event(&EventType::KeyRelease(RawKey::ShiftLeft));
        assert_eq!(press(&mut tracker, RawKey::Space), Some(Command::SendRequest));
    }
}
