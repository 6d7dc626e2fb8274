//! External system adapters
//!
//! Upstream agency sources and canonical store backends. Driver types never
//! leak past this layer; everything above it speaks domain types.

pub mod agency;
pub mod store;
