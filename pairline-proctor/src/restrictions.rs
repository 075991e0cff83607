use pairline_core::{BusClient, BusError, Outbound, RoomId, Violation, ViolationKind};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Interviewer,
    Interviewee,
}

/// Client-side activity the interview page forwards to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientActivity {
    PageHidden,
    PageVisible,
    Copy,
    Paste,
    Cut,
    ContextMenu,
    KeyDown { key: char, ctrl: bool, meta: bool },
}

pub fn violation_for(activity: ClientActivity) -> Option<ViolationKind> {
    match activity {
        ClientActivity::PageHidden => Some(ViolationKind::TabSwitch),
        ClientActivity::PageVisible => None,
        ClientActivity::Copy => Some(ViolationKind::Copy),
        ClientActivity::Paste => Some(ViolationKind::Paste),
        ClientActivity::Cut => Some(ViolationKind::Cut),
        ClientActivity::ContextMenu => Some(ViolationKind::ContextMenu),
        ClientActivity::KeyDown { key, ctrl, meta } => {
            let restricted = matches!(key.to_ascii_lowercase(), 'c' | 'v' | 'x' | 'a');
            ((ctrl || meta) && restricted).then_some(ViolationKind::Shortcut(key))
        }
    }
}

/// Reports restricted activity of the interviewee to the room.
pub struct RestrictionMonitor {
    role: Role,
    room_id: RoomId,
    bus: Arc<dyn BusClient>,
}

impl RestrictionMonitor {
    pub fn new(role: Role, room_id: RoomId, bus: Arc<dyn BusClient>) -> Self {
        Self { role, room_id, bus }
    }

    /// Returns the violation raised for `activity`, if any. The caller
    /// blocks the default action for everything except a tab switch.
    pub async fn observe(&self, activity: ClientActivity) -> Result<Option<ViolationKind>, BusError> {
        if self.role != Role::Interviewee {
            return Ok(None);
        }
        let Some(kind) = violation_for(activity) else {
            return Ok(None);
        };

        warn!("Restricted activity '{}' in room {}", kind, self.room_id);
        self.bus
            .emit(Outbound::Violation(Violation {
                kind,
                room_id: self.room_id.clone(),
            }))
            .await?;
        Ok(Some(kind))
    }
}
