//! Transaction coordinator bound to an initialized persistence unit.

use futures::future::BoxFuture;
use sqlx::{Any, Transaction};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::persistence::PersistenceUnit;

/// Open transaction on the unit's pool. Rolled back on drop unless committed.
pub type UnitOfWork = Transaction<'static, Any>;

/// Demarcates units of work against a [`PersistenceUnit`].
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    unit: Arc<PersistenceUnit>,
    created_at: Instant,
}

impl TransactionCoordinator {
    pub fn unit(&self) -> &Arc<PersistenceUnit> {
        &self.unit
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub async fn begin(&self) -> AppResult<UnitOfWork> {
        let tx = self.unit.pool().inner().begin().await?;
        debug!("transaction started");
        Ok(tx)
    }

    /// Run `work` in a transaction: commit when it returns `Ok`, roll back otherwise.
    ///
    /// ```ignore
    /// coordinator
    ///     .transactional(|tx| Box::pin(async move {
    ///         sqlx::query("DELETE FROM notes").execute(&mut **tx).await?;
    ///         Ok::<_, AppError>(())
    ///     }))
    ///     .await?;
    /// ```
    pub async fn transactional<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut UnitOfWork) -> BoxFuture<'c, Result<T, E>>,
        E: From<sqlx::Error>,
    {
        let mut tx = self.unit.pool().inner().begin().await?;
        match work(&mut tx).await {
            Ok(value) => {
                tx.commit().await?;
                debug!("transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "rollback failed");
                }
                debug!("transaction rolled back");
                Err(e)
            }
        }
    }
}

/// Bind a coordinator to an initialized unit. Only a unit produced by
/// [`crate::persistence::PersistenceFactory::initialize`] can be passed here.
pub fn build_transaction_coordinator(unit: &Arc<PersistenceUnit>) -> TransactionCoordinator {
    TransactionCoordinator {
        unit: Arc::clone(unit),
        created_at: Instant::now(),
    }
}
