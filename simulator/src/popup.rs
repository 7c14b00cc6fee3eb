//! Key-press notices with time-based expiration.

use std::time::Instant;

use energy_flow_card::AnimationStyle;

use crate::timing::POPUP_DURATION;

/// Notice shown after a key press, with the moment it was triggered.
#[derive(Clone, Copy, Debug)]
pub enum Popup {
    /// Animation style cycled.
    Style(AnimationStyle, Instant),
    /// Speed factor sign flipped; holds the new factor.
    Speed(f64, Instant),
    /// Second vehicle shown or hidden.
    SecondCar(bool, Instant),
}

impl Popup {
    #[inline]
    pub const fn start_time(&self) -> Instant {
        match self {
            Self::Style(_, t) | Self::Speed(_, t) | Self::SecondCar(_, t) => *t,
        }
    }

    #[inline]
    pub fn is_expired(&self) -> bool { self.start_time().elapsed() >= POPUP_DURATION }
}
