//! Navigation panel rendering
//!
//! Collects what the finder screen shows (distance, bearing, arrow, heading
//! state, status line and meter countdown) into a [`NavigationPanel`] and
//! renders it as human-readable text or JSON.

use crate::algorithms::fusion::{NavigationFix, WAITING_FOR_POSITION};
use crate::algorithms::geo::format_distance;
use crate::core::{CountdownState, HeadingReading};
use crate::hardware::LocateError;
use crate::reminder::countdown::{format_remaining, CountdownPhase};
use serde::{Deserialize, Serialize};

/// Status line while a fix is available
pub const NAVIGATING: &str = "Navigating";

/// What the arrow rotation is relative to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowMode {
    /// Device "up" is assumed to be North
    NorthUp,
    /// Corrected by the live compass heading
    HeadingRelative,
}

/// Everything the finder screen displays for one update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationPanel {
    /// Formatted distance, e.g. "240 m" or "1.50 km"
    pub distance: Option<String>,
    pub distance_m: Option<f64>,
    pub bearing_deg: Option<u16>,
    pub arrow_rotation_deg: Option<f64>,
    pub arrow_mode: ArrowMode,
    /// Why there is no heading, if there is none
    pub heading_status: Option<String>,
    /// A tap is needed before compass events flow
    pub heading_permission_needed: bool,
    pub status: String,
    /// Remaining meter time as "MM:SS"
    pub countdown: Option<String>,
    pub countdown_expired: bool,
}

impl NavigationPanel {
    /// Panel for a fusion result; `None` shows the waiting status
    pub fn from_fix(fix: Option<&NavigationFix>) -> Self {
        match fix {
            Some(fix) => Self {
                distance: Some(format_distance(fix.distance_m)),
                distance_m: Some(fix.distance_m),
                bearing_deg: Some(fix.bearing_deg),
                arrow_rotation_deg: Some(fix.arrow_rotation_deg),
                arrow_mode: if fix.is_heading_relative() {
                    ArrowMode::HeadingRelative
                } else {
                    ArrowMode::NorthUp
                },
                heading_status: None,
                heading_permission_needed: false,
                status: NAVIGATING.to_string(),
                countdown: None,
                countdown_expired: false,
            },
            None => Self {
                distance: None,
                distance_m: None,
                bearing_deg: None,
                arrow_rotation_deg: None,
                arrow_mode: ArrowMode::NorthUp,
                heading_status: None,
                heading_permission_needed: false,
                status: WAITING_FOR_POSITION.to_string(),
                countdown: None,
                countdown_expired: false,
            },
        }
    }

    /// Replace the status line with the error's user-facing message
    pub fn with_error(mut self, error: &LocateError) -> Self {
        self.status = error.status_message();
        self
    }

    pub fn with_heading(mut self, reading: &HeadingReading) -> Self {
        self.heading_status = reading.error.clone();
        self.heading_permission_needed = reading.permission_needed;
        self
    }

    /// Show the meter countdown unless it is idle
    pub fn with_countdown(mut self, state: &CountdownState) -> Self {
        match state.phase() {
            CountdownPhase::Idle => {
                self.countdown = None;
                self.countdown_expired = false;
            }
            phase => {
                self.countdown = Some(format_remaining(state.remaining_ms));
                self.countdown_expired = phase == CountdownPhase::Expired;
            }
        }
        self
    }
}

/// Human-readable text formatter
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    /// Single-line output
    pub compact: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }

    pub fn format_text(&self, panel: &NavigationPanel) -> String {
        if self.compact {
            return self.format_compact(panel);
        }

        let mut output = String::new();
        if let (Some(distance), Some(bearing), Some(rotation)) =
            (&panel.distance, panel.bearing_deg, panel.arrow_rotation_deg)
        {
            output.push_str(&format!("Distance: {}\n", distance));
            output.push_str(&format!("Bearing:  {:03}°\n", bearing));
            output.push_str(&format!(
                "Arrow:    {:.0}° ({})\n",
                rotation,
                mode_label(panel.arrow_mode)
            ));
        }
        if let Some(heading_status) = &panel.heading_status {
            output.push_str(&format!("Heading:  {}\n", heading_status));
        }
        if panel.heading_permission_needed {
            output.push_str("Heading:  tap to enable compass\n");
        }
        output.push_str(&format!("Status:   {}\n", panel.status));
        if let Some(countdown) = &panel.countdown {
            let suffix = if panel.countdown_expired { " (expired)" } else { "" };
            output.push_str(&format!("Meter:    {}{}\n", countdown, suffix));
        }
        output
    }

    fn format_compact(&self, panel: &NavigationPanel) -> String {
        let mut parts = Vec::new();
        if let (Some(distance), Some(bearing), Some(rotation)) =
            (&panel.distance, panel.bearing_deg, panel.arrow_rotation_deg)
        {
            parts.push(distance.clone());
            parts.push(format!("brg {}°", bearing));
            parts.push(format!("arrow {:.0}°", rotation));
        }
        parts.push(panel.status.clone());
        if let Some(countdown) = &panel.countdown {
            parts.push(format!("meter {}", countdown));
        }
        parts.join(" | ")
    }
}

fn mode_label(mode: ArrowMode) -> &'static str {
    match mode {
        ArrowMode::NorthUp => "north-up",
        ArrowMode::HeadingRelative => "heading-relative",
    }
}

/// JSON formatter for structured output
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Pretty print JSON
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pretty-printing JSON formatter
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format_json(&self, panel: &NavigationPanel) -> Result<String, serde_json::Error> {
        if self.pretty {
            serde_json::to_string_pretty(panel)
        } else {
            serde_json::to_string(panel)
        }
    }
}
