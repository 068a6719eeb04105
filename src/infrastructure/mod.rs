//! Adapters behind the domain ports: file-backed stores for production and
//! in-memory ones for tests.

pub mod csv_sheet;
pub mod in_memory;
pub mod json_directory;
