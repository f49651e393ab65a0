pub mod action_log;
pub mod human;
pub mod report;
