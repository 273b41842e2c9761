use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Reference to another employee by id. Reports are referenced, never owned.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRef {
    pub employee_id: String,
}

impl EmployeeRef {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub department: String,
    #[serde(default)]
    pub direct_reports: Vec<EmployeeRef>,
}

impl Employee {
    /// Builds a record under `employee_id`, dropping repeated report ids.
    pub fn from_draft(employee_id: impl Into<String>, draft: EmployeeDraft) -> Self {
        let mut seen = HashSet::new();
        let direct_reports = draft
            .direct_reports
            .into_iter()
            .filter(|report| seen.insert(report.employee_id.clone()))
            .collect();
        Self {
            employee_id: employee_id.into(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            position: draft.position,
            department: draft.department,
            direct_reports,
        }
    }

    pub fn direct_report_ids(&self) -> impl Iterator<Item = &str> {
        self.direct_reports
            .iter()
            .map(|report| report.employee_id.as_str())
    }
}

/// Create/replace payload. A client supplied `employeeId` is ignored.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDraft {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub direct_reports: Vec<EmployeeRef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Compensation {
    pub compensation_id: String,
    pub employee: Employee,
    pub salary: u32,
    pub effective_date: NaiveDateTime,
}

/// Create payload. Only the employee id is read; the canonical record is
/// resolved from the store.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompensationDraft {
    pub employee: EmployeeRef,
    pub salary: u32,
    pub effective_date: NaiveDateTime,
}

/// Persisted shape of a compensation: the employee is held by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompensationRecord {
    pub compensation_id: String,
    pub employee_id: String,
    pub salary: u32,
    pub effective_date: NaiveDateTime,
}

impl CompensationRecord {
    pub fn into_compensation(self, employee: Employee) -> Compensation {
        Compensation {
            compensation_id: self.compensation_id,
            employee,
            salary: self.salary,
            effective_date: self.effective_date,
        }
    }
}

/// Derived per query, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportingStructure {
    pub employee: Employee,
    pub number_of_reports: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_ignores_client_id_and_extra_report_fields() {
        let draft: EmployeeDraft = serde_json::from_value(json!({
            "employeeId": "client-chosen",
            "firstName": "Debbie",
            "lastName": "Downer",
            "position": "Receiver",
            "department": "Complaints",
            "directReports": [
                { "employeeId": "a", "firstName": "Ignored" },
                { "employeeId": "a" },
                { "employeeId": "b" }
            ]
        }))
        .unwrap();

        let employee = Employee::from_draft("server-id", draft);
        assert_eq!(employee.employee_id, "server-id");
        assert_eq!(employee.direct_report_ids().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn draft_requires_names() {
        let err = serde_json::from_value::<EmployeeDraft>(json!({ "lastName": "Bono" }))
            .unwrap_err();
        assert!(err.to_string().contains("firstName"));
    }

    #[test]
    fn compensation_draft_reads_naive_dates() {
        let draft: CompensationDraft = serde_json::from_value(json!({
            "employee": { "employeeId": "62c1084e", "firstName": "Pete" },
            "salary": 200000,
            "effectiveDate": "2024-04-12T00:00:01"
        }))
        .unwrap();
        assert_eq!(draft.employee.employee_id, "62c1084e");
        assert_eq!(draft.effective_date.to_string(), "2024-04-12 00:00:01");
    }

    #[test]
    fn negative_salary_is_rejected() {
        let result = serde_json::from_value::<CompensationDraft>(json!({
            "employee": { "employeeId": "x" },
            "salary": -5,
            "effectiveDate": "2024-04-12T00:00:01"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn reporting_structure_uses_camel_case() {
        let structure = ReportingStructure {
            employee: Employee::from_draft(
                "x",
                EmployeeDraft {
                    first_name: "John".into(),
                    last_name: "Lennon".into(),
                    ..EmployeeDraft::default()
                },
            ),
            number_of_reports: 4,
        };
        let value = serde_json::to_value(structure).unwrap();
        assert_eq!(value["numberOfReports"], 4);
        assert_eq!(value["employee"]["employeeId"], "x");
    }
}
