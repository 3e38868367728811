//! Inactivity-driven backlight dimming.
//!
//! The controller is fed from the render loop with the current monotonic
//! time and whether the panel is being touched. It owns the Bright/Dimmed
//! decision; actually setting the backlight is left to the caller, so the
//! same logic drives the AXP2101 on hardware and a color-scaling shim in the
//! simulator.

/// Seconds without a touch before the display dims.
pub const DIM_TIMEOUT_SECS: u64 = 300;

/// Backlight level while bright, on the 0-255 scale.
pub const BRIGHTNESS_ACTIVE: u8 = 128;

/// Backlight level while dimmed.
pub const BRIGHTNESS_DIMMED: u8 = 24;

/// Backlight state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPower {
    Bright,
    Dimmed,
}

impl DisplayPower {
    /// Backlight level for this state.
    pub const fn brightness(self) -> u8 {
        match self {
            Self::Bright => BRIGHTNESS_ACTIVE,
            Self::Dimmed => BRIGHTNESS_DIMMED,
        }
    }
}

/// Bright/Dimmed state machine over a monotonic clock.
///
/// Any touch resets the inactivity anchor; a touch while dimmed additionally
/// restores brightness. Dimming fires exactly once per idle period.
pub struct PowerController {
    state: DisplayPower,
    idle_since: u64,
    timeout_secs: u64,
}

impl PowerController {
    /// New controller, bright, idle anchor at `now_secs`.
    pub fn new(now_secs: u64) -> Self {
        Self::with_timeout(now_secs, DIM_TIMEOUT_SECS)
    }

    pub fn with_timeout(now_secs: u64, timeout_secs: u64) -> Self {
        Self {
            state: DisplayPower::Bright,
            idle_since: now_secs,
            timeout_secs,
        }
    }

    pub fn state(&self) -> DisplayPower {
        self.state
    }

    /// Advance the state machine.
    ///
    /// Returns `Some(state)` only when the backlight level must change, so
    /// callers write to the power chip exactly once per transition.
    pub fn tick(&mut self, now_secs: u64, touched: bool) -> Option<DisplayPower> {
        if touched {
            self.idle_since = now_secs;
            if self.state == DisplayPower::Dimmed {
                self.state = DisplayPower::Bright;
                return Some(DisplayPower::Bright);
            }
            return None;
        }

        if self.state == DisplayPower::Bright
            && now_secs.saturating_sub(self.idle_since) >= self.timeout_secs
        {
            self.state = DisplayPower::Dimmed;
            return Some(DisplayPower::Dimmed);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_bright_one_second_before_the_threshold() {
        let mut pc = PowerController::new(0);
        assert_eq!(pc.tick(299, false), None);
        assert_eq!(pc.state(), DisplayPower::Bright);
    }

    #[test]
    fn dims_exactly_once_at_the_threshold() {
        let mut pc = PowerController::new(0);
        assert_eq!(pc.tick(300, false), Some(DisplayPower::Dimmed));
        // Further idle ticks must not re-emit the transition.
        assert_eq!(pc.tick(301, false), None);
        assert_eq!(pc.tick(10_000, false), None);
        assert_eq!(pc.state(), DisplayPower::Dimmed);
    }

    #[test]
    fn touch_while_dimmed_restores_brightness_and_restarts_the_timer() {
        let mut pc = PowerController::new(0);
        assert_eq!(pc.tick(300, false), Some(DisplayPower::Dimmed));
        assert_eq!(pc.tick(400, true), Some(DisplayPower::Bright));

        // Timer restarts from the touch, not from the original anchor.
        assert_eq!(pc.tick(699, false), None);
        assert_eq!(pc.tick(700, false), Some(DisplayPower::Dimmed));
    }

    #[test]
    fn touch_while_bright_resets_the_counter_without_a_transition() {
        let mut pc = PowerController::new(0);
        assert_eq!(pc.tick(200, true), None);
        assert_eq!(pc.state(), DisplayPower::Bright);

        // 300 seconds from the touch, not from construction.
        assert_eq!(pc.tick(499, false), None);
        assert_eq!(pc.tick(500, false), Some(DisplayPower::Dimmed));
    }

    #[test]
    fn continuous_touch_never_dims() {
        let mut pc = PowerController::new(0);
        for now in (0..2000).step_by(100) {
            assert_eq!(pc.tick(now, true), None);
        }
        assert_eq!(pc.state(), DisplayPower::Bright);
    }

    #[test]
    fn brightness_levels_match_the_operating_points() {
        assert_eq!(DisplayPower::Bright.brightness(), 128);
        assert_eq!(DisplayPower::Dimmed.brightness(), 24);
    }

    #[test]
    fn custom_timeout_is_honored() {
        let mut pc = PowerController::with_timeout(0, 5);
        assert_eq!(pc.tick(4, false), None);
        assert_eq!(pc.tick(5, false), Some(DisplayPower::Dimmed));
    }
}
