use std::path::Path;

/// Trait for signing raw deployment descriptor bytes with a key on disk.
///
/// Implementations are sync — key loading is file I/O and signing is CPU-bound.
/// Callers on the async runtime go through `spawn_blocking`.
pub trait DeploymentSigner: Send + Sync {
    /// Sign `data` exactly as given with the private key stored at `key_file`.
    /// Returns the encoded signature string.
    fn sign(&self, key_file: &Path, data: &[u8]) -> anyhow::Result<String>;

    /// Algorithm identifier string (e.g. "rsa-pss-sha256").
    fn algorithm(&self) -> &str;
}
