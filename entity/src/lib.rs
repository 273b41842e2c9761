//! sea-orm entities backing the HR stores.

pub mod compensation;
pub mod employee;
