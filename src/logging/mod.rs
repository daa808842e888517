// file: src/logging/mod.rs
// version: 1.0.0
// guid: 31c8e5f2-0d74-4a96-b1e8-5f2a9c4d7603

//! Logging initialization

pub mod logger;

pub use logger::init_logger;
