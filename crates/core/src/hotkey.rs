//! Global hotkey table and dispatcher.
//!
//! The binding table is static and established at startup. Registration
//! failures are reported per binding and never abort startup: whatever did
//! register stays active.

use crate::command::{Command, Direction};
use crate::platform::WindowService;
use std::fmt;
use std::ops::BitOr;

/// Modifier mask. Bit values match the Win32 `MOD_*` constants so the
/// Windows backend can pass them straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const ALT: Modifiers = Modifiers(0x0001);
    pub const CONTROL: Modifiers = Modifiers(0x0002);
    pub const SHIFT: Modifiers = Modifiers(0x0004);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Self) -> Self::Output {
        Modifiers(self.0 | rhs.0)
    }
}

/// The keys the binding table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    B,
    D,
    H,
    Q,
    S,
    T,
    Space,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Windows virtual-key code.
    pub const fn vk_code(self) -> u32 {
        match self {
            Key::B => 0x42,
            Key::D => 0x44,
            Key::H => 0x48,
            Key::Q => 0x51,
            Key::S => 0x53,
            Key::T => 0x54,
            Key::Space => 0x20,
            Key::Up => 0x26,
            Key::Down => 0x28,
            Key::Left => 0x25,
            Key::Right => 0x27,
        }
    }
}

/// Identifier handed to the platform when registering a hotkey and echoed
/// back when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeyId(pub i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub id: HotkeyId,
    pub modifiers: Modifiers,
    pub key: Key,
    pub command: Command,
}

impl HotkeyBinding {
    const fn new(id: i32, modifiers: Modifiers, key: Key, command: Command) -> Self {
        Self {
            id: HotkeyId(id),
            modifiers,
            key,
            command,
        }
    }

    pub fn chord(&self) -> Chord {
        Chord {
            modifiers: self.modifiers,
            key: self.key,
        }
    }
}

/// Human-readable chord, e.g. `Ctrl+Alt+Up`.
pub struct Chord {
    modifiers: Modifiers,
    key: Key,
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(Modifiers::CONTROL) {
            f.write_str("Ctrl+")?;
        }
        if self.modifiers.contains(Modifiers::ALT) {
            f.write_str("Alt+")?;
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            f.write_str("Shift+")?;
        }
        write!(f, "{:?}", self.key)
    }
}

const CTRL: Modifiers = Modifiers::CONTROL;
const CTRL_ALT: Modifiers = Modifiers(Modifiers::CONTROL.0 | Modifiers::ALT.0);
const CTRL_SHIFT: Modifiers = Modifiers(Modifiers::CONTROL.0 | Modifiers::SHIFT.0);

/// The startup binding table.
pub const DEFAULT_BINDINGS: &[HotkeyBinding] = &[
    HotkeyBinding::new(9000, CTRL, Key::B, Command::ToggleVisibility),
    HotkeyBinding::new(9001, CTRL_ALT, Key::Up, Command::Move(Direction::Up)),
    HotkeyBinding::new(9002, CTRL_ALT, Key::Down, Command::Move(Direction::Down)),
    HotkeyBinding::new(9003, CTRL_ALT, Key::Left, Command::Move(Direction::Left)),
    HotkeyBinding::new(9004, CTRL_ALT, Key::Right, Command::Move(Direction::Right)),
    HotkeyBinding::new(9005, CTRL, Key::H, Command::Capture),
    HotkeyBinding::new(9006, CTRL_ALT, Key::D, Command::ClearSnapshots),
    HotkeyBinding::new(9007, CTRL_SHIFT, Key::S, Command::AdvanceDimension),
    HotkeyBinding::new(9008, CTRL_SHIFT, Key::Up, Command::AdvanceValue),
    HotkeyBinding::new(9009, CTRL_SHIFT, Key::T, Command::ViewText),
    HotkeyBinding::new(9010, CTRL_SHIFT, Key::Q, Command::Quit),
    HotkeyBinding::new(9011, CTRL, Key::Space, Command::SendRequest),
];

/// Maps hotkey identifiers and chords to commands, and tracks which
/// bindings the platform accepted.
pub struct HotkeyDispatcher {
    bindings: Vec<HotkeyBinding>,
    registered: Vec<HotkeyId>,
}

impl HotkeyDispatcher {
    pub fn new(bindings: &[HotkeyBinding]) -> Self {
        Self {
            bindings: bindings.to_vec(),
            registered: Vec::new(),
        }
    }

    /// Command bound to a platform hotkey identifier.
    pub fn command_for(&self, id: HotkeyId) -> Option<Command> {
        self.bindings
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.command)
    }

    /// Command bound to an exact modifier/key chord. Used by backends that
    /// observe raw key events instead of registered hotkeys.
    pub fn command_for_chord(&self, modifiers: Modifiers, key: Key) -> Option<Command> {
        self.bindings
            .iter()
            .find(|b| b.modifiers == modifiers && b.key == key)
            .map(|b| b.command)
    }

    /// Registers every binding with the platform. Failures are logged one by
    /// one; returns how many bindings are active.
    pub fn register_all<W: WindowService + ?Sized>(&mut self, service: &mut W) -> usize {
        for binding in &self.bindings {
            match service.register_hotkey(binding) {
                Ok(()) => {
                    log::debug!("Registered {} -> {:?}", binding.chord(), binding.command);
                    self.registered.push(binding.id);
                }
                Err(e) => log::warn!("{}", e),
            }
        }
        log::info!(
            "{} of {} hotkeys registered",
            self.registered.len(),
            self.bindings.len()
        );
        self.registered.len()
    }

    pub fn unregister_all<W: WindowService + ?Sized>(&mut self, service: &mut W) {
        for id in self.registered.drain(..) {
            if let Err(e) = service.unregister_hotkey(id) {
                log::debug!("Unregistering hotkey {:?} failed: {}", id, e);
            }
        }
    }

    pub fn registered(&self) -> &[HotkeyId] {
        &self.registered
    }
}

impl Default for HotkeyDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_BINDINGS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWindow;
    use std::collections::HashSet;

    #[test]
    fn identifiers_and_chords_are_unique() {
        let ids: HashSet<_> = DEFAULT_BINDINGS.iter().map(|b| b.id).collect();
        assert_eq!(ids.len(), DEFAULT_BINDINGS.len());

        let chords: HashSet<_> = DEFAULT_BINDINGS
            .iter()
            .map(|b| (b.modifiers, b.key))
            .collect();
        assert_eq!(chords.len(), DEFAULT_BINDINGS.len());
    }

    #[test]
    fn lookup_by_id_and_chord() {
        let dispatcher = HotkeyDispatcher::default();
        assert_eq!(
            dispatcher.command_for(HotkeyId(9000)),
            Some(Command::ToggleVisibility)
        );
        assert_eq!(
            dispatcher.command_for(HotkeyId(9011)),
            Some(Command::SendRequest)
        );
        assert_eq!(dispatcher.command_for(HotkeyId(1)), None);
        assert_eq!(
            dispatcher.command_for_chord(CTRL_ALT, Key::Left),
            Some(Command::Move(Direction::Left))
        );
        assert_eq!(dispatcher.command_for_chord(CTRL, Key::Left), None);
    }

    #[test]
    fn chord_display() {
        let binding = DEFAULT_BINDINGS[8];
        assert_eq!(binding.chord().to_string(), "Ctrl+Shift+Up");
    }

    #[test]
    fn failed_registrations_do_not_block_others() {
        let mut window = FakeWindow::default();
        window.reject_hotkeys.insert(HotkeyId(9000));
        window.reject_hotkeys.insert(HotkeyId(9005));

        let mut dispatcher = HotkeyDispatcher::default();
        let active = dispatcher.register_all(&mut window);

        assert_eq!(active, DEFAULT_BINDINGS.len() - 2);
        assert!(!dispatcher.registered().contains(&HotkeyId(9000)));
        assert!(dispatcher.registered().contains(&HotkeyId(9001)));

        dispatcher.unregister_all(&mut window);
        assert!(window.hotkeys.is_empty());
        assert!(dispatcher.registered().is_empty());
    }
}
