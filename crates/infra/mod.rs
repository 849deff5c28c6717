pub mod cache;
pub mod db;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
