// Discord side of the bug report relay: turns notifications into channel embeds.

pub mod report_dispatcher;

pub use report_dispatcher::DiscordReportNotifier;
