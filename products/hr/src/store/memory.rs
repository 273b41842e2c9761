use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CompensationStore, DirectReportSource, EmployeeStore, StoreResult};
use crate::model::{CompensationRecord, Employee, EmployeeRef};

/// Process-local store, used by tests and `serve --in-memory`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    employees: HashMap<String, Row>,
    compensations: Vec<CompensationRecord>,
}

#[derive(Clone, Debug)]
struct Row {
    first_name: String,
    last_name: String,
    position: String,
    department: String,
    manager_id: Option<String>,
}

impl State {
    fn reports_of(&self, manager_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .employees
            .iter()
            .filter(|(_, row)| row.manager_id.as_deref() == Some(manager_id))
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn attach_reports(&mut self, employee: &Employee) {
        for report_id in employee.direct_report_ids() {
            if let Some(row) = self.employees.get_mut(report_id) {
                row.manager_id = Some(employee.employee_id.clone());
            }
        }
    }
}

impl From<&Employee> for Row {
    fn from(employee: &Employee) -> Self {
        Self {
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            position: employee.position.clone(),
            department: employee.department.clone(),
            manager_id: None,
        }
    }
}

#[async_trait]
impl DirectReportSource for InMemoryStore {
    async fn direct_report_ids(&self, employee_id: &str) -> StoreResult<Vec<String>> {
        Ok(self.state.read().await.reports_of(employee_id))
    }
}

#[async_trait]
impl EmployeeStore for InMemoryStore {
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .employees
            .insert(employee.employee_id.clone(), Row::from(employee));
        state.attach_reports(employee);
        Ok(())
    }

    async fn find_employee(&self, employee_id: &str) -> StoreResult<Option<Employee>> {
        let state = self.state.read().await;
        Ok(state.employees.get(employee_id).map(|row| Employee {
            employee_id: employee_id.to_string(),
            first_name: row.first_name.clone(),
            last_name: row.last_name.clone(),
            position: row.position.clone(),
            department: row.department.clone(),
            direct_reports: state
                .reports_of(employee_id)
                .into_iter()
                .map(EmployeeRef::new)
                .collect(),
        }))
    }

    async fn replace_employee(&self, employee: &Employee) -> StoreResult<()> {
        let mut state = self.state.write().await;
        let manager_id = state
            .employees
            .get(&employee.employee_id)
            .and_then(|row| row.manager_id.clone());
        state.employees.insert(
            employee.employee_id.clone(),
            Row {
                manager_id,
                ..Row::from(employee)
            },
        );
        for row in state.employees.values_mut() {
            if row.manager_id.as_deref() == Some(employee.employee_id.as_str()) {
                row.manager_id = None;
            }
        }
        state.attach_reports(employee);
        Ok(())
    }

    async fn manager_of(&self, employee_id: &str) -> StoreResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state
            .employees
            .get(employee_id)
            .and_then(|row| row.manager_id.clone()))
    }
}

#[async_trait]
impl CompensationStore for InMemoryStore {
    async fn insert_compensation(&self, record: &CompensationRecord) -> StoreResult<()> {
        self.state.write().await.compensations.push(record.clone());
        Ok(())
    }

    async fn compensations_for(&self, employee_id: &str) -> StoreResult<Vec<CompensationRecord>> {
        let state = self.state.read().await;
        Ok(state
            .compensations
            .iter()
            .filter(|record| record.employee_id == employee_id)
            .cloned()
            .collect())
    }
}
