// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "bug_reports/mod.rs"]
pub mod bug_reports;
