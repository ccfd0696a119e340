use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Trailing debounce for status persistence, milliseconds.
    pub sync_ms: u64,
    /// Window in which two distinct word taps become a merge proposal.
    pub merge_window_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            sync_ms: 500,
            merge_window_ms: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Press duration before the radial menu arms, milliseconds.
    pub long_press_ms: u64,
    /// Pointer travel that cancels a pending long-press, logical pixels.
    pub press_slop_px: f64,
    /// Radius around the origin inside which no direction is armed.
    pub deadzone_px: f64,
    /// Distance from the menu center to each directional target.
    pub menu_radius_px: f64,
    /// Radius of one directional target button.
    pub menu_button_radius_px: f64,
    /// Minimum gap kept between a target and the viewport edge.
    pub menu_edge_padding_px: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 500,
            press_slop_px: 10.0,
            deadzone_px: 28.0,
            menu_radius_px: 96.0,
            menu_button_radius_px: 28.0,
            menu_edge_padding_px: 8.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub debounce: DebounceConfig,
    pub gesture: GestureConfig,
    /// Shortest normalized key that is tracked as vocabulary.
    pub min_key_chars: usize,
    /// Capacity of the broadcast event channel.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce: DebounceConfig::default(),
            gesture: GestureConfig::default(),
            min_key_chars: 2,
            event_channel_capacity: 1024,
        }
    }
}
