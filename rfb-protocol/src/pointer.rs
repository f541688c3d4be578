//! Pointer event encoding with persistent button state.
//!
//! VNC pointer events report the full set of held buttons on every message,
//! not the delta. [`PointerEncoder`] remembers which buttons are down between
//! calls so that pressing Right while Left is held sends both bits.

use crate::messages::client::PointerEvent;
use bitflags::bitflags;
use std::fmt;
use tracing::trace;

bitflags! {
    /// VNC pointer button mask (bits).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ButtonMask: u8 {
        const LEFT   = 1 << 0; // Button 1
        const MIDDLE = 1 << 1; // Button 2
        const RIGHT  = 1 << 2; // Button 3
    }
}

/// Buttons a caller may press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
}

impl PointerButton {
    /// The mask bit for this button.
    pub fn mask(self) -> ButtonMask {
        match self {
            Self::Left => ButtonMask::LEFT,
            Self::Right => ButtonMask::RIGHT,
        }
    }
}

impl fmt::Display for PointerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Currently held buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonState {
    pub left_down: bool,
    pub right_down: bool,
}

impl ButtonState {
    /// Mask with one bit per held button.
    pub fn mask(&self) -> ButtonMask {
        let mut mask = ButtonMask::empty();
        mask.set(ButtonMask::LEFT, self.left_down);
        mask.set(ButtonMask::RIGHT, self.right_down);
        mask
    }

    /// State after `button` goes down or up.
    pub fn apply(self, button: PointerButton, down: bool) -> Self {
        match button {
            PointerButton::Left => Self {
                left_down: down,
                ..self
            },
            PointerButton::Right => Self {
                right_down: down,
                ..self
            },
        }
    }
}

/// Apply one button transition and build the message that reports it.
pub fn encode_pointer_event(
    state: ButtonState,
    button: PointerButton,
    down: bool,
    x: u16,
    y: u16,
) -> (ButtonState, PointerEvent) {
    let next = state.apply(button, down);
    let event = PointerEvent {
        button_mask: next.mask().bits(),
        x,
        y,
    };
    (next, event)
}

/// Owns the button state of one connection.
#[derive(Debug, Clone, Default)]
pub struct PointerEncoder {
    state: ButtonState,
}

impl PointerEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the transition and return the message to send.
    pub fn encode(&mut self, button: PointerButton, down: bool, x: u16, y: u16) -> PointerEvent {
        let (next, event) = encode_pointer_event(self.state, button, down, x, y);
        trace!(
            "pointer {} {} at ({}, {}) mask={:#05b}",
            button,
            if down { "down" } else { "up" },
            x,
            y,
            event.button_mask
        );
        self.state = next;
        event
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Forget all held buttons.
    pub fn reset(&mut self) {
        self.state = ButtonState::default();
    }
}
