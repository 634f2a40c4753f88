//! The hash oracle boundary.
//!
//! The module contract's transaction hash involves domain separation and
//! struct encoding that live in deployed code outside this crate's control.
//! Re-implementing the scheme locally would silently drift from the deployed
//! contract, so the hash is always obtained from the contract's own pure
//! `getTransactionHash` entry point. The batching decision upstream of that
//! call is this crate's responsibility; the hash itself is not.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers::types::{Address, H256, U256};

use crate::contracts::{DaoModule, GnosisSafe};
use crate::errors::VerifyError;
use crate::types::ModuleTransaction;

/// The per-transaction hash computation, injected so tests can swap the
/// deployed contract for fixed values.
#[async_trait]
pub trait TransactionHasher: Send + Sync {
    /// Returns the hash the module contract computes for `tx` at positional
    /// index `index` (the zero-based position of the transaction's group
    /// within the proposal).
    async fn transaction_hash(
        &self,
        tx: &ModuleTransaction,
        index: u64,
    ) -> Result<H256, VerifyError>;
}

/// Hash oracle backed by the deployed module contract.
pub struct ModuleHasher<M> {
    module: DaoModule<M>,
}

impl<M: Middleware + 'static> ModuleHasher<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self {
            module: DaoModule::new(address, client),
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> TransactionHasher for ModuleHasher<M> {
    async fn transaction_hash(
        &self,
        tx: &ModuleTransaction,
        index: u64,
    ) -> Result<H256, VerifyError> {
        let hash = self
            .module
            .get_transaction_hash(
                tx.to,
                tx.value,
                tx.data.clone(),
                tx.operation as u8,
                U256::from(index),
            )
            .call()
            .await
            .map_err(|err| VerifyError::external("getTransactionHash", err))?;
        Ok(H256::from(hash))
    }
}

/// Reads the address of the Safe the module executes through.
pub async fn module_avatar<M: Middleware + 'static>(
    module: Address,
    client: Arc<M>,
) -> Result<Address, VerifyError> {
    DaoModule::new(module, client)
        .avatar()
        .call()
        .await
        .map_err(|err| VerifyError::external("avatar", err))
}

/// Reads the contract-suite version string the Safe reports.
pub async fn suite_version<M: Middleware + 'static>(
    safe: Address,
    client: Arc<M>,
) -> Result<String, VerifyError> {
    GnosisSafe::new(safe, client)
        .version()
        .call()
        .await
        .map_err(|err| VerifyError::external("VERSION", err))
}

/// Test double returning pre-baked hashes by positional index.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub struct FixedHasher {
    hashes: Vec<H256>,
}

#[cfg(any(test, feature = "test-utils"))]
impl FixedHasher {
    pub fn new(hashes: Vec<H256>) -> Self {
        Self { hashes }
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl TransactionHasher for FixedHasher {
    async fn transaction_hash(
        &self,
        _tx: &ModuleTransaction,
        index: u64,
    ) -> Result<H256, VerifyError> {
        self.hashes.get(index as usize).copied().ok_or_else(|| {
            VerifyError::external(
                "getTransactionHash",
                format!("no fixed hash for index {index}"),
            )
        })
    }
}
