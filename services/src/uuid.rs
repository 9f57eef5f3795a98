// helpers.rs
use uuid::Uuid;

/// Deterministic UUIDv5 from an arbitrary string id.
///
/// Backends that only accept UUID point ids (Qdrant) store the
/// derived UUID and keep the original string in the payload.
pub fn stable_uuid(id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, id.as_bytes())
}
