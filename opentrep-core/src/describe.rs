//! A single display capability implemented independently per entity,
//! rather than a shared base class carrying `toStream`/`fromStream`/
//! `describeKey`-style methods.

/// A one-line, human-readable description of an entity, used only for
/// logging and debugging. Not a serialization format: persistence goes
/// through `serde`/`bincode` directly on the concrete types that need it.
pub trait Describe {
    fn describe_key(&self) -> String;
}
