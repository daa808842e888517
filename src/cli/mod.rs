// file: src/cli/mod.rs
// version: 1.0.0
// guid: 58f2b9c4-7e01-4da3-9b65-2c8f0d3e6a91

//! Command line interface

pub mod args;
pub mod commands;
