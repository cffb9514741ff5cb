//! Library-change notifications
//!
//! On any accepted save, a change notification is broadcast so other parts
//! of the system can refresh their view of the owner's library. This is the
//! only output the tracker produces besides the persisted job state.

use cadenza_core::dto::save::SaveKind;

/// Emitted after the persistence API accepts a save
#[derive(Debug, Clone)]
pub struct LibraryEvent {
    pub owner: String,
    pub task_id: String,
    pub kind: SaveKind,
}
