pub mod dashboard;
pub mod footer;
pub mod help;
pub mod holders;
pub mod mount_table;
pub mod popup;
pub mod services;
pub mod theme;
