use platform_api::ApiError;
use products_hr::{HrError, ReportingError};

/// Translates service failures into transport errors. Unknown employees on
/// compensation create surface as a generic failure.
pub fn api_error(err: HrError) -> ApiError {
    match err {
        HrError::UnknownEmployee(_) => {
            ApiError::BadRequest("unable to create compensation".into())
        }
        HrError::MissingEmployeeId | HrError::InvalidReports(_) => {
            ApiError::BadRequest(err.to_string())
        }
        HrError::Reporting(ReportingError::NotFound { .. }) => ApiError::NotFound,
        other => ApiError::internal(other.into()),
    }
}
