//! # Button events
//! The three physical buttons and the logical press events produced from their edges.

use embassy_time::Instant;

/// The buttons of the system
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Green button
    Green,
    /// Blue button
    Blue,
    /// Yellow button
    Yellow,
}

impl Button {
    /// All buttons, in channel order
    pub const ALL: [Self; 3] = [Self::Green, Self::Blue, Self::Yellow];

    /// Index of the input channel of this button
    pub const fn index(self) -> usize {
        match self {
            Self::Green => 0,
            Self::Blue => 1,
            Self::Yellow => 2,
        }
    }

    /// Lower-case name, as shown on the display
    pub const fn name(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }
}

/// A debounced, logical button press. Consumed right away by the menu, never stored.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    /// The button that was pressed
    pub button: Button,
    /// When the edge that produced the press was seen
    pub at: Instant,
}
