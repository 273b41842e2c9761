use thiserror::Error;

use crate::{reporting::ReportingError, store::StoreError};

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("employee {0} does not exist")]
    UnknownEmployee(String),
    #[error("employee id is required")]
    MissingEmployeeId,
    #[error("invalid direct reports: {0}")]
    InvalidReports(String),
    #[error(transparent)]
    Reporting(#[from] ReportingError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
