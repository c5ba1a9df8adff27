use async_trait::async_trait;
use crate::error::Error;
use crate::models::Ledger;

/// Durable storage for the redemption ledger. The whole snapshot is read
/// and written at once.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Returns the stored ledger. Implementations fail soft: missing or
    /// unreadable data comes back as an empty ledger, not an error.
    async fn load(&self) -> Ledger;

    /// Writes the full snapshot. Must not return `Ok` before the data is
    /// durable.
    async fn persist(&self, ledger: &Ledger) -> Result<(), Error>;
}
