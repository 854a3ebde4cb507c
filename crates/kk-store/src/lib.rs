use async_trait::async_trait;
use kk_common::Credential;

pub mod error;

#[cfg(feature = "kadmin")]
pub mod kadmin;

#[cfg(feature = "cm")]
pub mod cm;

pub use error::StoreError;

#[cfg(feature = "kadmin")]
pub use kadmin::KadminStore;

#[cfg(feature = "cm")]
pub use cm::{CmRole, CmStore};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Capability interface over the external identity store.
///
/// Each method issues exactly one backend operation and reports its outcome as
/// a typed error; there is no current-state probe, no retry, and no state kept
/// between calls. The reconciler takes this trait so tests can substitute a
/// scripted store.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Backend name for logs and error messages.
    fn backend(&self) -> &str;

    /// Create `principal` with the given credential.
    ///
    /// `attributes` is an opaque backend token (e.g. principal flags) passed
    /// through on creation only. A principal that already exists surfaces as
    /// [`StoreError::AlreadyExists`].
    async fn create(
        &self,
        principal: &str,
        credential: &Credential,
        attributes: Option<&str>,
    ) -> Result<()>;

    /// Delete `principal`. A principal that is already gone surfaces as
    /// [`StoreError::NotFound`].
    async fn delete(&self, principal: &str) -> Result<()>;

    /// Re-key `principal` with the given credential. Never idempotent: any
    /// backend complaint is a real failure.
    async fn change_password(&self, principal: &str, credential: &Credential) -> Result<()>;
}
