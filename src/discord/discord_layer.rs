// Discord layer - adapters that deliver core output to Discord.

#[path = "bug_reports/mod.rs"]
pub mod bug_reports;
