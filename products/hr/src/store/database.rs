use async_trait::async_trait;
use entity::{compensation, employee};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
    sea_query::Expr,
};

use super::{CompensationStore, DirectReportSource, EmployeeStore, StoreError, StoreResult};
use crate::model::{CompensationRecord, Employee, EmployeeRef};

/// sea-orm backed store; works against Postgres and SQLite.
#[derive(Clone, Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

async fn report_ids<C: ConnectionTrait>(db: &C, manager_id: &str) -> StoreResult<Vec<String>> {
    let ids = employee::Entity::find()
        .select_only()
        .column(employee::Column::Id)
        .filter(employee::Column::ManagerId.eq(manager_id))
        .order_by_asc(employee::Column::Id)
        .into_tuple::<String>()
        .all(db)
        .await?;
    Ok(ids)
}

async fn attach_reports<C: ConnectionTrait>(db: &C, employee: &Employee) -> StoreResult<()> {
    let ids: Vec<String> = employee.direct_report_ids().map(str::to_string).collect();
    if ids.is_empty() {
        return Ok(());
    }
    employee::Entity::update_many()
        .col_expr(
            employee::Column::ManagerId,
            Expr::value(employee.employee_id.clone()),
        )
        .filter(employee::Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(())
}

fn active_model(employee: &Employee) -> employee::ActiveModel {
    employee::ActiveModel {
        id: Set(employee.employee_id.clone()),
        first_name: Set(employee.first_name.clone()),
        last_name: Set(employee.last_name.clone()),
        position: Set(employee.position.clone()),
        department: Set(employee.department.clone()),
        manager_id: NotSet,
    }
}

#[async_trait]
impl DirectReportSource for SeaOrmStore {
    async fn direct_report_ids(&self, employee_id: &str) -> StoreResult<Vec<String>> {
        report_ids(&self.db, employee_id).await
    }
}

#[async_trait]
impl EmployeeStore for SeaOrmStore {
    async fn insert_employee(&self, employee: &Employee) -> StoreResult<()> {
        let txn = self.db.begin().await?;
        let model = employee::ActiveModel {
            manager_id: Set(None),
            ..active_model(employee)
        };
        employee::Entity::insert(model)
            .exec_without_returning(&txn)
            .await?;
        attach_reports(&txn, employee).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn find_employee(&self, employee_id: &str) -> StoreResult<Option<Employee>> {
        let Some(model) = employee::Entity::find_by_id(employee_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let direct_reports = report_ids(&self.db, &model.id)
            .await?
            .into_iter()
            .map(EmployeeRef::new)
            .collect();
        Ok(Some(Employee {
            employee_id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            position: model.position,
            department: model.department,
            direct_reports,
        }))
    }

    async fn replace_employee(&self, employee: &Employee) -> StoreResult<()> {
        let txn = self.db.begin().await?;
        employee::Entity::update_many()
            .set(active_model(employee))
            .filter(employee::Column::Id.eq(employee.employee_id.as_str()))
            .exec(&txn)
            .await?;

        let keep: Vec<String> = employee.direct_report_ids().map(str::to_string).collect();
        let mut detach = employee::Entity::update_many()
            .col_expr(employee::Column::ManagerId, Expr::value(None::<String>))
            .filter(employee::Column::ManagerId.eq(employee.employee_id.as_str()));
        if !keep.is_empty() {
            detach = detach.filter(employee::Column::Id.is_not_in(keep));
        }
        detach.exec(&txn).await?;

        attach_reports(&txn, employee).await?;
        txn.commit().await?;
        Ok(())
    }

    async fn manager_of(&self, employee_id: &str) -> StoreResult<Option<String>> {
        let model = employee::Entity::find_by_id(employee_id.to_string())
            .one(&self.db)
            .await?;
        Ok(model.and_then(|model| model.manager_id))
    }
}

#[async_trait]
impl CompensationStore for SeaOrmStore {
    async fn insert_compensation(&self, record: &CompensationRecord) -> StoreResult<()> {
        let model = compensation::ActiveModel {
            id: Set(record.compensation_id.clone()),
            employee_id: Set(record.employee_id.clone()),
            salary: Set(i64::from(record.salary)),
            effective_date: Set(record.effective_date),
        };
        compensation::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await?;
        Ok(())
    }

    async fn compensations_for(&self, employee_id: &str) -> StoreResult<Vec<CompensationRecord>> {
        let models = compensation::Entity::find()
            .filter(compensation::Column::EmployeeId.eq(employee_id))
            .all(&self.db)
            .await?;
        models
            .into_iter()
            .map(|model| {
                let salary = u32::try_from(model.salary).map_err(|_| StoreError::Corrupt {
                    id: model.id.clone(),
                    reason: format!("salary {} out of range", model.salary),
                })?;
                Ok(CompensationRecord {
                    compensation_id: model.id,
                    employee_id: model.employee_id,
                    salary,
                    effective_date: model.effective_date,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmployeeDraft;
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database};

    async fn store() -> SeaOrmStore {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);
        let db = Database::connect(options).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        SeaOrmStore::new(db)
    }

    fn employee(id: &str, reports: &[&str]) -> Employee {
        Employee::from_draft(
            id,
            EmployeeDraft {
                first_name: id.to_uppercase(),
                last_name: "Test".into(),
                position: "Developer".into(),
                department: "Engineering".into(),
                direct_reports: reports.iter().map(|r| EmployeeRef::new(*r)).collect(),
            },
        )
    }

    #[tokio::test]
    async fn employees_round_trip_with_reports() {
        let store = store().await;
        store.insert_employee(&employee("b", &[])).await.unwrap();
        store.insert_employee(&employee("c", &[])).await.unwrap();
        store.insert_employee(&employee("a", &["b", "c"])).await.unwrap();

        let found = store.find_employee("a").await.unwrap().unwrap();
        assert_eq!(found, employee("a", &["b", "c"]));
        assert_eq!(store.manager_of("c").await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.manager_of("a").await.unwrap(), None);
        assert!(store.find_employee("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_rewrites_fields_and_report_set() {
        let store = store().await;
        store.insert_employee(&employee("c", &[])).await.unwrap();
        store.insert_employee(&employee("d", &[])).await.unwrap();
        store.insert_employee(&employee("b", &["c"])).await.unwrap();
        store.insert_employee(&employee("a", &["b"])).await.unwrap();

        let mut updated = employee("b", &["d"]);
        updated.position = "Developer VI".into();
        store.replace_employee(&updated).await.unwrap();

        let found = store.find_employee("b").await.unwrap().unwrap();
        assert_eq!(found.position, "Developer VI");
        assert_eq!(store.direct_report_ids("b").await.unwrap(), ["d"]);
        assert_eq!(store.manager_of("c").await.unwrap(), None);
        assert_eq!(store.manager_of("b").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn replace_with_no_reports_detaches_everyone() {
        let store = store().await;
        store.insert_employee(&employee("c", &[])).await.unwrap();
        store.insert_employee(&employee("b", &["c"])).await.unwrap();
        store.replace_employee(&employee("b", &[])).await.unwrap();
        assert!(store.direct_report_ids("b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn compensations_are_listed_per_employee() {
        let store = store().await;
        store.insert_employee(&employee("a", &[])).await.unwrap();
        let effective_date = NaiveDate::from_ymd_opt(2024, 4, 12)
            .unwrap()
            .and_hms_opt(0, 0, 1)
            .unwrap();
        for (id, salary) in [("c1", 200_000), ("c2", 300_000)] {
            store
                .insert_compensation(&CompensationRecord {
                    compensation_id: id.into(),
                    employee_id: "a".into(),
                    salary,
                    effective_date,
                })
                .await
                .unwrap();
        }

        let mut records = store.compensations_for("a").await.unwrap();
        records.sort_by_key(|record| record.salary);
        assert_eq!(
            records.iter().map(|r| r.salary).collect::<Vec<_>>(),
            [200_000, 300_000]
        );
        assert_eq!(records[0].effective_date, effective_date);
        assert!(store.compensations_for("b").await.unwrap().is_empty());
    }
}
