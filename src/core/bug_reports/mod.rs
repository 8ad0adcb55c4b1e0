// Core bug report module - the `!bug` command pipeline.
// Models, the command parser and the service that ties them together.

pub mod bug_report_models;
pub mod bug_report_service;
pub mod command_parser;

pub use bug_report_models::*;
pub use bug_report_service::*;
