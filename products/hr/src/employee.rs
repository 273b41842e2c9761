use std::{collections::HashSet, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::{
    error::{HrError, HrResult},
    model::{Employee, EmployeeDraft, ReportingStructure},
    reporting::ReportingEngine,
    store::EmployeeStore,
};

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn EmployeeStore>,
    engine: ReportingEngine,
    /// Held from report validation through the write, so two writers never
    /// validate against the same chart.
    chart_writes: Arc<Mutex<()>>,
}

impl EmployeeService {
    pub fn new(store: Arc<dyn EmployeeStore>, engine: ReportingEngine) -> Self {
        Self {
            store,
            engine,
            chart_writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &Arc<dyn EmployeeStore> {
        &self.store
    }

    /// Stores a new employee under a freshly generated id.
    #[instrument(name = "hr.employee.create", skip_all)]
    pub async fn create(&self, draft: EmployeeDraft) -> HrResult<Employee> {
        let employee = Employee::from_draft(Uuid::new_v4().to_string(), draft);
        debug!(
            employee_id = %employee.employee_id,
            "creating employee {} {}", employee.first_name, employee.last_name
        );
        let _chart = self.chart_writes.lock().await;
        self.check_reports(&employee).await?;
        self.store.insert_employee(&employee).await?;
        Ok(employee)
    }

    pub async fn get(&self, employee_id: &str) -> HrResult<Option<Employee>> {
        if employee_id.is_empty() {
            return Ok(None);
        }
        Ok(self.store.find_employee(employee_id).await?)
    }

    /// Replaces every field of an existing employee, keeping its id.
    /// Returns `None` when no employee has that id.
    #[instrument(name = "hr.employee.replace", skip(self, draft))]
    pub async fn replace(
        &self,
        employee_id: &str,
        draft: EmployeeDraft,
    ) -> HrResult<Option<Employee>> {
        let _chart = self.chart_writes.lock().await;
        if self.get(employee_id).await?.is_none() {
            debug!("employee to replace does not exist");
            return Ok(None);
        }
        let employee = Employee::from_draft(employee_id, draft);
        self.check_reports(&employee).await?;
        self.store.replace_employee(&employee).await?;
        Ok(self.store.find_employee(employee_id).await?)
    }

    pub async fn reporting_structure(&self, employee_id: &str) -> HrResult<ReportingStructure> {
        let structure = self
            .engine
            .reporting_structure(self.store.as_ref(), employee_id)
            .await?;
        debug!(
            employee_id,
            number_of_reports = structure.number_of_reports,
            "reporting structure built"
        );
        Ok(structure)
    }

    /// Keeps the chart a forest: each listed report must exist, must not
    /// already report elsewhere and must not sit above this employee.
    async fn check_reports(&self, employee: &Employee) -> HrResult<()> {
        if employee.direct_reports.is_empty() {
            return Ok(());
        }
        let ancestors = self.ancestors(&employee.employee_id).await?;
        for report_id in employee.direct_report_ids() {
            let reason = if report_id == employee.employee_id {
                Some(format!("{report_id} cannot report to themselves"))
            } else if ancestors.contains(report_id) {
                Some(format!(
                    "{report_id} is above {} in the reporting chain",
                    employee.employee_id
                ))
            } else if self.store.find_employee(report_id).await?.is_none() {
                Some(format!("{report_id} does not exist"))
            } else {
                match self.store.manager_of(report_id).await? {
                    Some(manager) if manager != employee.employee_id => {
                        Some(format!("{report_id} already reports to {manager}"))
                    }
                    _ => None,
                }
            };
            if let Some(reason) = reason {
                error!(employee_id = %employee.employee_id, %reason, "rejected direct reports");
                return Err(HrError::InvalidReports(reason));
            }
        }
        Ok(())
    }

    async fn ancestors(&self, employee_id: &str) -> HrResult<HashSet<String>> {
        let mut chain = HashSet::new();
        let mut current = self.store.manager_of(employee_id).await?;
        while let Some(manager) = current {
            if !chain.insert(manager.clone()) {
                break;
            }
            current = self.store.manager_of(&manager).await?;
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    use super::*;
    use crate::{
        model::EmployeeRef,
        reporting::ReportingError,
        store::{InMemoryStore, SeaOrmStore},
    };

    fn service() -> EmployeeService {
        EmployeeService::new(Arc::new(InMemoryStore::default()), ReportingEngine::default())
    }

    fn draft(first_name: &str, reports: &[&str]) -> EmployeeDraft {
        EmployeeDraft {
            first_name: first_name.into(),
            last_name: "Test".into(),
            position: "Developer".into(),
            department: "Engineering".into(),
            direct_reports: reports.iter().map(|r| EmployeeRef::new(*r)).collect(),
        }
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids() {
        let service = service();
        let first = service.create(draft("Debbie", &[])).await.unwrap();
        let second = service.create(draft("Debbie", &[])).await.unwrap();
        assert_ne!(first.employee_id, second.employee_id);
        assert!(Uuid::parse_str(&first.employee_id).is_ok());
        let stored = service.get(&first.employee_id).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn get_treats_empty_and_unknown_ids_as_absent() {
        let service = service();
        assert!(service.get("").await.unwrap().is_none());
        assert!(service.get("Invalid_Id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_preserves_id_and_is_visible() {
        let service = service();
        let created = service.create(draft("Pete", &[])).await.unwrap();
        let mut update = draft("Pete", &[]);
        update.position = "Developer VI".into();

        let replaced = service
            .replace(&created.employee_id, update)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.employee_id, created.employee_id);
        let stored = service.get(&created.employee_id).await.unwrap().unwrap();
        assert_eq!(stored.position, "Developer VI");
    }

    #[tokio::test]
    async fn replace_unknown_employee_is_none() {
        let service = service();
        let result = service.replace("Invalid_Id", draft("Sunny", &[])).await.unwrap();
        assert!(result.is_none());
        assert!(service.get("Invalid_Id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reports_must_exist() {
        let service = service();
        let err = service.create(draft("Ringo", &["ghost"])).await.unwrap_err();
        assert!(matches!(err, HrError::InvalidReports(_)));
    }

    #[tokio::test]
    async fn reports_cannot_have_two_managers() {
        let service = service();
        let pete = service.create(draft("Pete", &[])).await.unwrap();
        service
            .create(draft("Ringo", &[pete.employee_id.as_str()]))
            .await
            .unwrap();
        let err = service
            .create(draft("Paul", &[pete.employee_id.as_str()]))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::InvalidReports(reason) if reason.contains("already reports")));
    }

    #[tokio::test]
    async fn managers_cannot_become_reports_of_their_reports() {
        let service = service();
        let pete = service.create(draft("Pete", &[])).await.unwrap();
        let ringo = service
            .create(draft("Ringo", &[pete.employee_id.as_str()]))
            .await
            .unwrap();
        let john = service
            .create(draft("John", &[ringo.employee_id.as_str()]))
            .await
            .unwrap();

        let err = service
            .replace(&pete.employee_id, draft("Pete", &[john.employee_id.as_str()]))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::InvalidReports(_)));

        let err = service
            .replace(&pete.employee_id, draft("Pete", &[pete.employee_id.as_str()]))
            .await
            .unwrap_err();
        assert!(matches!(err, HrError::InvalidReports(_)));
    }

    #[tokio::test]
    async fn replace_can_keep_existing_reports() {
        let service = service();
        let pete = service.create(draft("Pete", &[])).await.unwrap();
        let ringo = service
            .create(draft("Ringo", &[pete.employee_id.as_str()]))
            .await
            .unwrap();
        let replaced = service
            .replace(&ringo.employee_id, draft("Ringo", &[pete.employee_id.as_str()]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            replaced.direct_report_ids().collect::<Vec<_>>(),
            [pete.employee_id.as_str()]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn opposing_concurrent_replaces_cannot_build_a_cycle() {
        for _ in 0..20 {
            let service = service();
            let a = service.create(draft("A", &[])).await.unwrap();
            let b = service.create(draft("B", &[])).await.unwrap();

            let (first, second) = tokio::join!(
                service.replace(&a.employee_id, draft("A", &[b.employee_id.as_str()])),
                service.replace(&b.employee_id, draft("B", &[a.employee_id.as_str()])),
            );
            let outcomes = [first, second];
            assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(outcomes
                .iter()
                .any(|r| matches!(r, Err(HrError::InvalidReports(_)))));

            let a_reports = service.reporting_structure(&a.employee_id).await.unwrap();
            let b_reports = service.reporting_structure(&b.employee_id).await.unwrap();
            assert_eq!(a_reports.number_of_reports + b_reports.number_of_reports, 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn opposing_concurrent_replaces_on_sqlite() {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let service =
            EmployeeService::new(Arc::new(SeaOrmStore::new(db)), ReportingEngine::default());

        for _ in 0..10 {
            let a = service.create(draft("A", &[])).await.unwrap();
            let b = service.create(draft("B", &[])).await.unwrap();
            let (first, second) = tokio::join!(
                service.replace(&a.employee_id, draft("A", &[b.employee_id.as_str()])),
                service.replace(&b.employee_id, draft("B", &[a.employee_id.as_str()])),
            );
            assert!(first.is_ok() != second.is_ok());
            assert!(service.reporting_structure(&a.employee_id).await.is_ok());
            assert!(service.reporting_structure(&b.employee_id).await.is_ok());
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_cannot_share_a_report() {
        for _ in 0..20 {
            let service = service();
            let pete = service.create(draft("Pete", &[])).await.unwrap();

            let (first, second) = tokio::join!(
                service.create(draft("Ringo", &[pete.employee_id.as_str()])),
                service.create(draft("Paul", &[pete.employee_id.as_str()])),
            );
            let winner = match (first, second) {
                (Ok(winner), Err(HrError::InvalidReports(_)))
                | (Err(HrError::InvalidReports(_)), Ok(winner)) => winner,
                other => panic!("expected exactly one manager to win, got {other:?}"),
            };
            let structure = service.reporting_structure(&winner.employee_id).await.unwrap();
            assert_eq!(structure.number_of_reports, 1);
        }
    }

    #[tokio::test]
    async fn reporting_structure_scenario() {
        let service = service();
        let w = service.create(draft("W", &[])).await.unwrap();
        let y = service.create(draft("Y", &[w.employee_id.as_str()])).await.unwrap();
        let z = service.create(draft("Z", &[])).await.unwrap();
        let x = service
            .create(draft("X", &[y.employee_id.as_str(), z.employee_id.as_str()]))
            .await
            .unwrap();

        let structure = service.reporting_structure(&x.employee_id).await.unwrap();
        assert_eq!(structure.number_of_reports, 3);
        assert_eq!(structure.employee.employee_id, x.employee_id);
        let structure = service.reporting_structure(&z.employee_id).await.unwrap();
        assert_eq!(structure.number_of_reports, 0);

        let err = service.reporting_structure("").await.unwrap_err();
        assert!(matches!(
            err,
            HrError::Reporting(ReportingError::NotFound { .. })
        ));
    }
}
