//! Core event and direction types shared across the crane control stack.
//!
//! The input classifier (debounce/edge detection, out of crate) produces
//! [`InputEvent`] tokens; the controller consumes them and emits motion
//! intents tagged with an [`Axis`] and a [`MotionDirection`].
//!
//! # Direction convention
//!
//! `Forward` raises the hoist / rotates the platform right; `Backward`
//! lowers the hoist / rotates left. The mapping from physical pulse widths
//! to these logical directions lives entirely in [`ServoConfig`], so a
//! miswired servo is corrected in configuration, not in control logic.
//!
//! [`ServoConfig`]: crate::config::ServoConfig

/// One of the two independently actuated degrees of freedom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// The hoist (up/down).
    Vertical,
    /// The rotating platform (left/right).
    Platform,
}

impl Axis {
    /// Returns the axis as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Axis::Vertical => "vertical",
            Axis::Platform => "platform",
        }
    }
}

/// Logical direction of motion for one axis.
///
/// Defaults to [`Stop`](Self::Stop) for safety.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MotionDirection {
    /// Raise the hoist / rotate the platform right.
    Forward,
    /// Lower the hoist / rotate the platform left.
    Backward,
    /// No net motion (neutral pulse applied).
    #[default]
    Stop,
}

impl MotionDirection {
    /// Returns the direction as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MotionDirection::Forward => "forward",
            MotionDirection::Backward => "backward",
            MotionDirection::Stop => "stop",
        }
    }

    /// Returns the opposite direction. `Stop` has no opposite and maps to
    /// itself.
    #[inline]
    pub const fn opposite(&self) -> Self {
        match self {
            MotionDirection::Forward => MotionDirection::Backward,
            MotionDirection::Backward => MotionDirection::Forward,
            MotionDirection::Stop => MotionDirection::Stop,
        }
    }

    /// True if this direction is the reverse of `other` (both non-stop).
    #[inline]
    pub fn is_reversal_of(&self, other: MotionDirection) -> bool {
        *self != MotionDirection::Stop
            && other != MotionDirection::Stop
            && *self != other
    }
}

/// Discrete, already-debounced operator input token.
///
/// Produced once per debounced transition (buttons, limit switches, reset)
/// or repeatedly while a switch is held in position. The enum is total:
/// there is no "unknown event" value, malformed input is rejected upstream
/// by the classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InputEvent {
    /// Vertical enable button pressed.
    VerticalButtonPressed,
    /// Vertical enable button released.
    VerticalButtonReleased,
    /// Platform enable button pressed.
    PlatformButtonPressed,
    /// Platform enable button released.
    PlatformButtonReleased,
    /// Vertical selector switch moved to "up".
    VerticalSwitchUp,
    /// Vertical selector switch moved to "down".
    VerticalSwitchDown,
    /// Vertical selector switch returned to neutral.
    VerticalSwitchNeutral,
    /// Platform selector switch moved to "left".
    PlatformSwitchLeft,
    /// Platform selector switch moved to "right".
    PlatformSwitchRight,
    /// Platform selector switch returned to neutral.
    PlatformSwitchNeutral,
    /// Top travel limit switch tripped.
    LimitTopHit,
    /// Bottom travel limit switch tripped.
    LimitBottomHit,
    /// Left rotation limit switch tripped.
    LimitLeftHit,
    /// Right rotation limit switch tripped.
    LimitRightHit,
    /// Reset button pressed.
    Reset,
}

impl InputEvent {
    /// True for events produced by direct operator action (buttons,
    /// switches, reset) as opposed to limit switches. In Auto and
    /// Calibration any of these aborts the running sequence.
    pub fn is_manual_input(&self) -> bool {
        !matches!(
            self,
            InputEvent::LimitTopHit
                | InputEvent::LimitBottomHit
                | InputEvent::LimitLeftHit
                | InputEvent::LimitRightHit
        )
    }

    /// The axis a limit event applies to, if this is a limit event.
    pub fn limit_axis(&self) -> Option<Axis> {
        match self {
            InputEvent::LimitTopHit | InputEvent::LimitBottomHit => Some(Axis::Vertical),
            InputEvent::LimitLeftHit | InputEvent::LimitRightHit => Some(Axis::Platform),
            _ => None,
        }
    }
}

/// Controller operating mode.
///
/// Exactly one mode is active at a time. Entering any mode force-stops both
/// axes and clears all latched input state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CraneMode {
    /// Direct operator control via buttons and switches.
    #[default]
    Manual,
    /// Autonomous pick-and-place sequence.
    Auto,
    /// Open-loop actuator characterization.
    Calibration,
    /// Latched safe state after a limit hit; exits only via reset/mode-set.
    Blocked,
}

impl CraneMode {
    /// Returns the mode as a lowercase string.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CraneMode::Manual => "manual",
            CraneMode::Auto => "auto",
            CraneMode::Calibration => "calibration",
            CraneMode::Blocked => "blocked",
        }
    }

    /// Parse a mode-set request from text input.
    ///
    /// Only externally requestable modes parse; `Blocked` is entered by the
    /// controller itself and is deliberately not accepted here. Unknown text
    /// yields `None` and the caller keeps its current mode.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_cranez::CraneMode;
    ///
    /// assert_eq!(CraneMode::from_text("manual"), Some(CraneMode::Manual));
    /// assert_eq!(CraneMode::from_text(" AUTO "), Some(CraneMode::Auto));
    /// assert_eq!(CraneMode::from_text("cal"), Some(CraneMode::Calibration));
    /// assert_eq!(CraneMode::from_text("blocked"), None);
    /// assert_eq!(CraneMode::from_text("bogus"), None);
    /// ```
    pub fn from_text(s: &str) -> Option<Self> {
        let mut buf = heapless::String::<16>::new();
        for c in s.trim().chars() {
            if buf.push(c.to_ascii_lowercase()).is_err() {
                return None;
            }
        }
        match buf.as_str() {
            "manual" | "man" => Some(CraneMode::Manual),
            "auto" => Some(CraneMode::Auto),
            "calibration" | "cal" => Some(CraneMode::Calibration),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MotionDirection Tests
    // =========================================================================

    #[test]
    fn direction_default_is_stop() {
        assert_eq!(MotionDirection::default(), MotionDirection::Stop);
    }

    #[test]
    fn direction_opposite() {
        assert_eq!(
            MotionDirection::Forward.opposite(),
            MotionDirection::Backward
        );
        assert_eq!(
            MotionDirection::Backward.opposite(),
            MotionDirection::Forward
        );
        assert_eq!(MotionDirection::Stop.opposite(), MotionDirection::Stop);
    }

    #[test]
    fn direction_reversal_detection() {
        assert!(MotionDirection::Forward.is_reversal_of(MotionDirection::Backward));
        assert!(MotionDirection::Backward.is_reversal_of(MotionDirection::Forward));
        assert!(!MotionDirection::Forward.is_reversal_of(MotionDirection::Forward));
        assert!(!MotionDirection::Stop.is_reversal_of(MotionDirection::Forward));
        assert!(!MotionDirection::Forward.is_reversal_of(MotionDirection::Stop));
    }

    #[test]
    fn direction_as_str() {
        assert_eq!(MotionDirection::Forward.as_str(), "forward");
        assert_eq!(MotionDirection::Backward.as_str(), "backward");
        assert_eq!(MotionDirection::Stop.as_str(), "stop");
    }

    // =========================================================================
    // InputEvent Tests
    // =========================================================================

    #[test]
    fn limit_events_are_not_manual_input() {
        assert!(!InputEvent::LimitTopHit.is_manual_input());
        assert!(!InputEvent::LimitBottomHit.is_manual_input());
        assert!(!InputEvent::LimitLeftHit.is_manual_input());
        assert!(!InputEvent::LimitRightHit.is_manual_input());
    }

    #[test]
    fn operator_events_are_manual_input() {
        assert!(InputEvent::VerticalButtonPressed.is_manual_input());
        assert!(InputEvent::PlatformSwitchLeft.is_manual_input());
        assert!(InputEvent::VerticalSwitchNeutral.is_manual_input());
        assert!(InputEvent::Reset.is_manual_input());
    }

    #[test]
    fn limit_axis_mapping() {
        assert_eq!(InputEvent::LimitTopHit.limit_axis(), Some(Axis::Vertical));
        assert_eq!(
            InputEvent::LimitBottomHit.limit_axis(),
            Some(Axis::Vertical)
        );
        assert_eq!(InputEvent::LimitLeftHit.limit_axis(), Some(Axis::Platform));
        assert_eq!(InputEvent::LimitRightHit.limit_axis(), Some(Axis::Platform));
        assert_eq!(InputEvent::Reset.limit_axis(), None);
        assert_eq!(InputEvent::VerticalButtonPressed.limit_axis(), None);
    }

    // =========================================================================
    // CraneMode Tests
    // =========================================================================

    #[test]
    fn mode_default_is_manual() {
        assert_eq!(CraneMode::default(), CraneMode::Manual);
    }

    #[test]
    fn mode_from_text_accepts_requestable_modes() {
        assert_eq!(CraneMode::from_text("manual"), Some(CraneMode::Manual));
        assert_eq!(CraneMode::from_text("man"), Some(CraneMode::Manual));
        assert_eq!(CraneMode::from_text("auto"), Some(CraneMode::Auto));
        assert_eq!(
            CraneMode::from_text("calibration"),
            Some(CraneMode::Calibration)
        );
        assert_eq!(CraneMode::from_text("cal"), Some(CraneMode::Calibration));
    }

    #[test]
    fn mode_from_text_case_and_whitespace() {
        assert_eq!(CraneMode::from_text("  Auto\t"), Some(CraneMode::Auto));
        assert_eq!(CraneMode::from_text("MANUAL"), Some(CraneMode::Manual));
    }

    #[test]
    fn mode_from_text_rejects_unknown_and_blocked() {
        assert_eq!(CraneMode::from_text(""), None);
        assert_eq!(CraneMode::from_text("blocked"), None);
        assert_eq!(CraneMode::from_text("autopilot"), None);
        assert_eq!(CraneMode::from_text("a-very-long-unknown-mode-name"), None);
    }

    #[test]
    fn mode_as_str() {
        assert_eq!(CraneMode::Manual.as_str(), "manual");
        assert_eq!(CraneMode::Auto.as_str(), "auto");
        assert_eq!(CraneMode::Calibration.as_str(), "calibration");
        assert_eq!(CraneMode::Blocked.as_str(), "blocked");
    }
}
