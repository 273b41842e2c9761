//! Demo org chart loaded by `seed` and `serve --in-memory`.

use tracing::info;

use crate::{
    model::{Employee, EmployeeRef},
    store::{EmployeeStore, StoreResult},
};

pub const JOHN_LENNON: &str = "16a596ae-edd3-4847-99fe-c4518e82c86f";
pub const PAUL_MCCARTNEY: &str = "b7839309-3348-463b-a7e3-5de1c168beb3";
pub const RINGO_STARR: &str = "03aa1462-ffa9-4978-901b-7c001562cf6f";
pub const PETE_BEST: &str = "62c1084e-6e34-4630-93fd-9153afb65309";
pub const GEORGE_HARRISON: &str = "c0c2293d-16bd-4603-8e08-638a9d18b22c";

struct Fixture {
    id: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    position: &'static str,
    reports: &'static [&'static str],
}

// leaves first, so every listed report exists when its manager is written
const FIXTURES: &[Fixture] = &[
    Fixture {
        id: PAUL_MCCARTNEY,
        first_name: "Paul",
        last_name: "McCartney",
        position: "Developer I",
        reports: &[],
    },
    Fixture {
        id: PETE_BEST,
        first_name: "Pete",
        last_name: "Best",
        position: "Developer II",
        reports: &[],
    },
    Fixture {
        id: GEORGE_HARRISON,
        first_name: "George",
        last_name: "Harrison",
        position: "Developer III",
        reports: &[],
    },
    Fixture {
        id: RINGO_STARR,
        first_name: "Ringo",
        last_name: "Starr",
        position: "Developer V",
        reports: &[PETE_BEST, GEORGE_HARRISON],
    },
    Fixture {
        id: JOHN_LENNON,
        first_name: "John",
        last_name: "Lennon",
        position: "Development Manager",
        reports: &[PAUL_MCCARTNEY, RINGO_STARR],
    },
];

/// Loads the demo chart unless it is already present. Returns whether
/// anything was written.
pub async fn seed_demo(store: &dyn EmployeeStore) -> StoreResult<bool> {
    if store.find_employee(JOHN_LENNON).await?.is_some() {
        info!("demo employees already present");
        return Ok(false);
    }
    for fixture in FIXTURES {
        let employee = Employee {
            employee_id: fixture.id.to_string(),
            first_name: fixture.first_name.to_string(),
            last_name: fixture.last_name.to_string(),
            position: fixture.position.to_string(),
            department: "Engineering".to_string(),
            direct_reports: fixture.reports.iter().map(|id| EmployeeRef::new(*id)).collect(),
        };
        store.insert_employee(&employee).await?;
    }
    info!(employees = FIXTURES.len(), "demo employees seeded");
    Ok(true)
}
