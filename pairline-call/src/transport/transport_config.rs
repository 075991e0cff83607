use pairline_core::{CallConfig, IceServerConfig, utils::DEFAULT_STUN_ADDR};

/// ICE servers handed to every native connection.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                username: None,
                credential: None,
            }],
        }
    }
}

impl From<&CallConfig> for TransportConfig {
    fn from(config: &CallConfig) -> Self {
        Self {
            ice_servers: config.ice_servers.clone(),
        }
    }
}
