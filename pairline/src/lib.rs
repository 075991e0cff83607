pub use pairline_core::{ParticipantId, RoomId};

pub mod model {
    pub use pairline_core::model::*;
}

pub mod bus {
    pub use pairline_core::bus::*;
}

pub use pairline_core::{BusError, CallConfig, MediaError, PairlineConfig, ProctorConfig};

#[cfg(feature = "proctor")]
pub mod proctor {
    pub use pairline_proctor::*;
}

#[cfg(feature = "call")]
pub mod call {
    pub use pairline_call::*;
}
