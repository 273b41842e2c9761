//! Storage contracts for the HR slice and their two backends.

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

use crate::model::{CompensationRecord, Employee};

mod database;
mod memory;

pub use database::SeaOrmStore;
pub use memory::InMemoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Lookup used by the reporting engine: one call per hierarchy level.
///
/// A backend that can answer the whole subtree in one round-trip (a
/// recursive query, a closure table) still plugs in here without changing
/// the engine.
#[async_trait]
pub trait DirectReportSource: Send + Sync {
    /// Ids of employees whose manager is `employee_id`. Unknown ids yield an
    /// empty list, indistinguishable from an employee without reports.
    async fn direct_report_ids(&self, employee_id: &str) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait EmployeeStore: DirectReportSource {
    /// Persists a new record and points each listed report at it.
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()>;

    /// Exact-match lookup, with `direct_reports` filled from the relation.
    async fn find_employee(&self, employee_id: &str) -> StoreResult<Option<Employee>>;

    /// Full replacement keyed by `employee.employee_id`. Reports no longer
    /// listed are detached; the employee's own manager is untouched.
    async fn replace_employee(&self, employee: &Employee) -> StoreResult<()>;

    /// Manager of `employee_id`, `None` for top-level or unknown employees.
    async fn manager_of(&self, employee_id: &str) -> StoreResult<Option<String>>;
}

#[async_trait]
pub trait CompensationStore: Send + Sync {
    async fn insert_compensation(&self, record: &CompensationRecord) -> StoreResult<()>;

    async fn compensations_for(&self, employee_id: &str) -> StoreResult<Vec<CompensationRecord>>;
}
