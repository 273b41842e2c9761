use std::sync::Arc;

use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::{
    error::{HrError, HrResult},
    model::{Compensation, CompensationDraft, CompensationRecord},
    store::{CompensationStore, EmployeeStore, StoreError},
};

#[derive(Clone)]
pub struct CompensationService {
    employees: Arc<dyn EmployeeStore>,
    compensations: Arc<dyn CompensationStore>,
}

impl CompensationService {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        compensations: Arc<dyn CompensationStore>,
    ) -> Self {
        Self {
            employees,
            compensations,
        }
    }

    /// Records a compensation against an existing employee. The stored and
    /// returned employee is the canonical record, not the caller's copy.
    #[instrument(name = "hr.compensation.create", skip_all)]
    pub async fn create(&self, draft: CompensationDraft) -> HrResult<Compensation> {
        let employee_id = draft.employee.employee_id;
        let Some(employee) = self.employees.find_employee(&employee_id).await? else {
            error!(%employee_id, "unable to create compensation, employee does not exist");
            return Err(HrError::UnknownEmployee(employee_id));
        };
        let record = CompensationRecord {
            compensation_id: Uuid::new_v4().to_string(),
            employee_id,
            salary: draft.salary,
            effective_date: draft.effective_date,
        };
        self.compensations.insert_compensation(&record).await?;
        debug!(
            compensation_id = %record.compensation_id,
            employee_id = %record.employee_id,
            "compensation created"
        );
        Ok(record.into_compensation(employee))
    }

    /// Every compensation recorded for `employee_id`, in no particular order.
    pub async fn for_employee(&self, employee_id: &str) -> HrResult<Vec<Compensation>> {
        if employee_id.is_empty() {
            error!("employee id is empty, unable to get compensations");
            return Err(HrError::MissingEmployeeId);
        }
        let records = self.compensations.compensations_for(employee_id).await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let employee = self
            .employees
            .find_employee(employee_id)
            .await?
            .ok_or_else(|| StoreError::Corrupt {
                id: employee_id.to_string(),
                reason: "compensations reference a missing employee".into(),
            })?;
        Ok(records
            .into_iter()
            .map(|record| record.into_compensation(employee.clone()))
            .collect())
    }
}
