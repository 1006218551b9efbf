use anyhow::Result;

/// A named byte-keyed collection inside a `KeyValueStore`.
///
/// Calls are synchronous and local; implementations must not touch the network.
pub trait KeyValueCollection: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    fn remove(&self, key: &[u8]) -> Result<()>;
}
