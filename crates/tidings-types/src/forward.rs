//! Listener call convention.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Priority assigned when a listener is registered without one.
pub const DEFAULT_PRIORITY: i32 = 1;

/// How a plain listener receives its input.
///
/// | Mode | Listener receives |
/// |------|-------------------|
/// | `PassEvent` | the mutable event |
/// | `PassParams` | the event's params, unpacked as positional values |
///
/// Aggregate methods always receive the event regardless of mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForwardMode {
    /// Pass the event object itself.
    #[default]
    PassEvent,
    /// Pass the unpacked parameter values.
    PassParams,
}

impl ForwardMode {
    /// Returns the canonical string form (`"pass_event"` / `"pass_params"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassEvent => "pass_event",
            Self::PassParams => "pass_params",
        }
    }

    /// Returns `true` for [`ForwardMode::PassParams`].
    #[must_use]
    pub fn forwards_params(&self) -> bool {
        matches!(self, Self::PassParams)
    }
}

impl fmt::Display for ForwardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known [`ForwardMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownForwardMode(pub String);

impl fmt::Display for UnknownForwardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown forward mode '{}' (expected 'pass_event' or 'pass_params')",
            self.0
        )
    }
}

impl std::error::Error for UnknownForwardMode {}

impl FromStr for ForwardMode {
    type Err = UnknownForwardMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pass_event" | "event" => Ok(Self::PassEvent),
            "pass_params" | "params" => Ok(Self::PassParams),
            _ => Err(UnknownForwardMode(s.to_string())),
        }
    }
}
