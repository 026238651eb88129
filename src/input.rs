//! Input delivered by the host window.
//!
//! Events are queued as they arrive and consumed once per tick inside the
//! scene update, so drag resolution sees at most one pointer position per
//! frame.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keyboard modifier state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub logo: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        logo: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        alt: false,
        shift: false,
        logo: false,
    };
}

/// Named keys for special keyboard keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
    /// Character input
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer moved, with or without a button held
    PointerMoved { x: f32, y: f32 },
    PointerDown {
        x: f32,
        y: f32,
        button: MouseButton,
        modifiers: Modifiers,
    },
    PointerUp { x: f32, y: f32, button: MouseButton },
    /// Completed click; `count` is 2 for a double click
    Click {
        x: f32,
        y: f32,
        button: MouseButton,
        count: u32,
    },
    /// Wheel rotation in notches, positive = down
    Wheel { x: f32, y: f32, units: f32 },
    KeyPressed { key: Key, modifiers: Modifiers },
    /// Pointer left the window
    PointerLeft,
}

/// FIFO of events waiting for the next tick.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        // Consecutive moves collapse: only the latest position matters.
        if let (Some(InputEvent::PointerMoved { .. }), InputEvent::PointerMoved { .. }) =
            (self.events.back(), &event)
        {
            self.events.pop_back();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
