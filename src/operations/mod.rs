pub mod add;
pub mod browse;
pub mod import;
pub mod report;
pub mod summary;
