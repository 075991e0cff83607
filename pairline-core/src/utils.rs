pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

pub const DEFAULT_SMOOTHING_WINDOW: usize = 6;
pub const DEFAULT_ALERT_COOLDOWN_MS: u64 = 5000;

pub const DEFAULT_ANGLE_LOWER_DEG: f64 = 110.0;
pub const DEFAULT_ANGLE_UPPER_DEG: f64 = 133.0;

pub const DEFAULT_CENTER_LEFT: f64 = 200.0;
pub const DEFAULT_CENTER_RIGHT: f64 = 420.0;

pub const DEFAULT_MIN_FACE_AREA: f64 = 0.05;

/// One display refresh at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;

pub const DEFAULT_ICE_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_ICE_POLL_MAX_ATTEMPTS: u32 = 20;

pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;
