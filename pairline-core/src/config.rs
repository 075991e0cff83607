use crate::model::{IceServerConfig, KeypointName};
use crate::utils::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the proctoring pipeline.
///
/// Every field falls back to its default when absent from the source
/// document, so partial overrides are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProctorConfig {
    pub smoothing_window: usize,
    pub alert_cooldown_ms: u64,
    pub angle_lower_deg: f64,
    pub angle_upper_deg: f64,
    pub center_left: f64,
    pub center_right: f64,
    pub min_face_area: f64,
    pub frame_interval_ms: u64,
    /// Start of the line whose angle is tracked.
    pub angle_from: KeypointName,
    /// End of the line whose angle is tracked.
    pub angle_to: KeypointName,
}

impl ProctorConfig {
    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_millis(self.alert_cooldown_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            alert_cooldown_ms: DEFAULT_ALERT_COOLDOWN_MS,
            angle_lower_deg: DEFAULT_ANGLE_LOWER_DEG,
            angle_upper_deg: DEFAULT_ANGLE_UPPER_DEG,
            center_left: DEFAULT_CENTER_LEFT,
            center_right: DEFAULT_CENTER_RIGHT,
            min_face_area: DEFAULT_MIN_FACE_AREA,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            angle_from: KeypointName::LeftEye,
            angle_to: KeypointName::NoseTip,
        }
    }
}

/// Connectivity and negotiation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub ice_poll_interval_ms: u64,
    pub ice_poll_max_attempts: u32,
    pub event_channel_capacity: usize,
}

impl CallConfig {
    pub fn ice_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ice_poll_interval_ms)
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                username: None,
                credential: None,
            }],
            ice_poll_interval_ms: DEFAULT_ICE_POLL_INTERVAL_MS,
            ice_poll_max_attempts: DEFAULT_ICE_POLL_MAX_ATTEMPTS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairlineConfig {
    pub proctor: ProctorConfig,
    pub call: CallConfig,
}

impl PairlineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
