// File: src/repositories/mod.rs

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileLedgerRepository;
pub use memory::InMemoryLedgerRepository;
pub use couponbook_common::traits::LedgerRepository;
