//! Reporting structure: how many people report, directly or transitively,
//! to an employee.
//!
//! The walk is depth-first and asks the [`DirectReportSource`] for one
//! level at a time, so a chart of `n` employees costs `n` lookups. Only ids
//! travel per hop. Siblings are independent and may be visited in any order.
//!
//! The manager relation is expected to be a forest. Two guards keep a bad
//! chart from hanging a request: an employee met again on its own reporting
//! path fails with [`ReportingError::Cycle`], and a chain deeper than
//! [`TraversalLimits::max_depth`] fails with [`ReportingError::DepthExceeded`].
//! An employee reachable through two managers under the same root is counted
//! once per path; multi-manager charts are not supported.

use std::{collections::HashSet, sync::Arc};

use thiserror::Error;
use tracing::instrument;

use crate::{
    model::ReportingStructure,
    store::{DirectReportSource, EmployeeStore, StoreError},
};

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraversalLimits {
    /// Deepest level below the root that may be visited.
    pub max_depth: usize,
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("employee {employee_id} does not exist")]
    NotFound { employee_id: String },
    #[error("reporting cycle through employee {employee_id}")]
    Cycle { employee_id: String },
    #[error("reporting chain below {employee_id} is deeper than {max_depth} levels")]
    DepthExceeded { employee_id: String, max_depth: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Structured events raised while building a reporting structure.
pub trait TraversalObserver: Send + Sync {
    fn resolve_failed(&self, employee_id: &str);

    fn level_visited(&self, employee_id: &str, depth: usize, direct_reports: usize);
}

/// Forwards traversal events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl TraversalObserver for TracingObserver {
    fn resolve_failed(&self, employee_id: &str) {
        tracing::error!(
            employee_id,
            "employee does not exist; unable to build reporting structure"
        );
    }

    fn level_visited(&self, employee_id: &str, depth: usize, direct_reports: usize) {
        tracing::trace!(employee_id, depth, direct_reports, "visited reporting level");
    }
}

#[derive(Clone)]
pub struct ReportingEngine {
    limits: TraversalLimits,
    observer: Arc<dyn TraversalObserver>,
}

impl Default for ReportingEngine {
    fn default() -> Self {
        Self::new(TraversalLimits::default())
    }
}

impl std::fmt::Debug for ReportingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportingEngine")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

enum Step {
    Enter { employee_id: String, depth: usize },
    Leave { employee_id: String },
}

impl ReportingEngine {
    pub fn new(limits: TraversalLimits) -> Self {
        Self {
            limits,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TraversalObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Resolves `employee_id` and counts everyone below it.
    ///
    /// Unknown, empty or malformed ids fail with [`ReportingError::NotFound`];
    /// an existing employee without reports succeeds with zero.
    #[instrument(name = "hr.reporting_structure", skip(self, store))]
    pub async fn reporting_structure<S>(
        &self,
        store: &S,
        employee_id: &str,
    ) -> Result<ReportingStructure, ReportingError>
    where
        S: EmployeeStore + ?Sized,
    {
        let employee = if employee_id.is_empty() {
            None
        } else {
            store.find_employee(employee_id).await?
        };
        let Some(employee) = employee else {
            self.observer.resolve_failed(employee_id);
            return Err(ReportingError::NotFound {
                employee_id: employee_id.to_string(),
            });
        };
        let number_of_reports = self.count_reports(store, &employee.employee_id).await?;
        Ok(ReportingStructure {
            employee,
            number_of_reports,
        })
    }

    /// Counts the transitive reports of `root_id`, not including the root.
    pub async fn count_reports<S>(&self, source: &S, root_id: &str) -> Result<u64, ReportingError>
    where
        S: DirectReportSource + ?Sized,
    {
        let mut total = 0u64;
        let mut path: HashSet<String> = HashSet::new();
        let mut stack = vec![Step::Enter {
            employee_id: root_id.to_string(),
            depth: 0,
        }];

        while let Some(step) = stack.pop() {
            let (employee_id, depth) = match step {
                Step::Leave { employee_id } => {
                    path.remove(&employee_id);
                    continue;
                }
                Step::Enter { employee_id, depth } => (employee_id, depth),
            };

            let reports = source.direct_report_ids(&employee_id).await?;
            self.observer
                .level_visited(&employee_id, depth, reports.len());
            if reports.is_empty() {
                continue;
            }
            if depth + 1 > self.limits.max_depth {
                return Err(ReportingError::DepthExceeded {
                    employee_id: root_id.to_string(),
                    max_depth: self.limits.max_depth,
                });
            }

            total += reports.len() as u64;
            path.insert(employee_id.clone());
            stack.push(Step::Leave { employee_id });
            for report_id in reports {
                if path.contains(&report_id) {
                    return Err(ReportingError::Cycle {
                        employee_id: report_id,
                    });
                }
                stack.push(Step::Enter {
                    employee_id: report_id,
                    depth: depth + 1,
                });
            }
        }

        Ok(total)
    }
}
