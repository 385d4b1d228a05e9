//! Database implementations

pub mod dose_repository;
pub mod manager;
pub mod medication_repository;
pub mod pool;
pub mod schedule_repository;

pub use dose_repository::*;
pub use manager::*;
pub use medication_repository::*;
pub use pool::*;
pub use schedule_repository::*;
