//! HR vertical slice.
//!
//! Employees reference their direct reports by id; the store owns every
//! record and the reporting engine walks the manager -> report relation one
//! level at a time through [`store::DirectReportSource`].

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub mod compensation;
pub mod employee;
pub mod error;
pub mod model;
pub mod reporting;
pub mod seed;
pub mod store;

pub use compensation::CompensationService;
pub use employee::EmployeeService;
pub use error::{HrError, HrResult};
pub use model::{
    Compensation, CompensationDraft, CompensationRecord, Employee, EmployeeDraft, EmployeeRef,
    ReportingStructure,
};
pub use reporting::{
    ReportingEngine, ReportingError, TracingObserver, TraversalLimits, TraversalObserver,
};
pub use store::{
    CompensationStore, DirectReportSource, EmployeeStore, InMemoryStore, SeaOrmStore, StoreError,
    StoreResult,
};

/// Services wired against one backing store.
#[derive(Clone)]
pub struct Hr {
    pub employees: EmployeeService,
    pub compensations: CompensationService,
}

impl Hr {
    pub fn new(
        employee_store: Arc<dyn EmployeeStore>,
        compensation_store: Arc<dyn CompensationStore>,
        engine: ReportingEngine,
    ) -> Self {
        Self {
            employees: EmployeeService::new(employee_store.clone(), engine),
            compensations: CompensationService::new(employee_store, compensation_store),
        }
    }

    pub fn in_memory(engine: ReportingEngine) -> Self {
        let store = Arc::new(InMemoryStore::default());
        Self::new(store.clone(), store, engine)
    }

    pub fn database(db: DatabaseConnection, engine: ReportingEngine) -> Self {
        let store = Arc::new(SeaOrmStore::new(db));
        Self::new(store.clone(), store, engine)
    }

    pub fn employee_store(&self) -> &Arc<dyn EmployeeStore> {
        self.employees.store()
    }
}
