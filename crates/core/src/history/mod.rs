//! Dose history queries

pub mod service;

pub use service::HistoryService;
