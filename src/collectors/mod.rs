pub mod mount_table;
pub mod open_files;
pub mod services;
pub mod space;

/// Records extracted from raw tool output, plus how many lines did not fit
/// the expected shape and were skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self { records: Vec::new(), skipped: 0 }
    }
}
