// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "bug_reports/mod.rs"]
pub mod bug_reports;
