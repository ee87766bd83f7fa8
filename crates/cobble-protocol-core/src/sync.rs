use crate::error::ProtocolResult;
use crate::session::Session;
use cobble_types::{EntityId, Orientation, Position};

/// Current transform of an entity, as seen by the tick driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityView {
    pub id: EntityId,
    pub position: Position,
    pub orientation: Orientation,
}

/// Bring one observer up to date with every entity it can see.
///
/// Sends a teleport only for entities whose position or orientation changed since
/// the observer last heard about them. Visibility is decided by the caller.
/// Returns the number of packets sent.
pub fn update_positions<F>(
    observer: &Session,
    entities: &[EntityView],
    can_see: F,
) -> ProtocolResult<usize>
where
    F: Fn(&EntityView) -> bool,
{
    if !observer.is_active() {
        return Ok(0);
    }
    let self_id = observer.entity_id();
    let mut sent = 0;
    for entity in entities {
        if Some(entity.id) == self_id || !can_see(entity) {
            continue;
        }
        if observer.needs_update(entity.id, entity.position, entity.orientation) {
            observer.send_teleport(entity.id, entity.position, entity.orientation)?;
            sent += 1;
        }
    }
    Ok(sent)
}
