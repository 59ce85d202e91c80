//! Short opaque identifiers for exercises, days and logs.

use uuid::Uuid;

const ID_LEN: usize = 10;

/// Generate a new short identifier.
///
/// Taken from the head of a v4 UUID. Collisions are unlikely within one
/// store but not impossible; migration re-keys duplicates if they ever
/// reach persisted state.
pub fn new_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}
