//! Row <-> struct mapping for every table.
//!
//! Each function takes any SQLite executor, so the same query runs against the
//! pool for reads and against an open transaction for writes.

pub mod projects;
pub mod tasks;
pub mod users;
