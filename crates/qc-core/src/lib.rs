//! # qc-core
//!
//! Core types, stage plans, and error types for Quantum Console.
//!
//! This crate provides the foundational types shared across all Quantum Console crates:
//! - Run kinds and status enums with state machine transitions
//! - Run identifiers
//! - Stage descriptors and the built-in stage plans
//! - Audit and run report types returned to callers
//! - Cross-cutting error types

pub mod defaults;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod responses;
pub mod stage;
