use async_graphql::SimpleObject;
use chrono::NaiveDateTime;
use products_hr::{Compensation, Employee, ReportingStructure};

#[derive(Clone, Debug, SimpleObject)]
pub struct EmployeeNode {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department: String,
    pub direct_report_ids: Vec<String>,
}

impl From<Employee> for EmployeeNode {
    fn from(employee: Employee) -> Self {
        let direct_report_ids = employee
            .direct_reports
            .into_iter()
            .map(|report| report.employee_id)
            .collect();
        Self {
            employee_id: employee.employee_id,
            first_name: employee.first_name,
            last_name: employee.last_name,
            position: employee.position,
            department: employee.department,
            direct_report_ids,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct ReportingStructureNode {
    pub employee: EmployeeNode,
    pub number_of_reports: u64,
}

impl From<ReportingStructure> for ReportingStructureNode {
    fn from(structure: ReportingStructure) -> Self {
        Self {
            employee: structure.employee.into(),
            number_of_reports: structure.number_of_reports,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct CompensationNode {
    pub compensation_id: String,
    pub employee: EmployeeNode,
    pub salary: u32,
    pub effective_date: NaiveDateTime,
}

impl From<Compensation> for CompensationNode {
    fn from(compensation: Compensation) -> Self {
        Self {
            compensation_id: compensation.compensation_id,
            employee: compensation.employee.into(),
            salary: compensation.salary,
            effective_date: compensation.effective_date,
        }
    }
}
