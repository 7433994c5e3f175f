//! # mise-core
//!
//! Core types shared across all Mise crates.
//!
//! This crate provides the foundational types of the model-change audit pipeline:
//! - Entity type and change type enums
//! - The statically declared entity catalog (tables and columns per entity)
//! - `Row` snapshots and the ordered `ChangeSet` diff
//! - The `AuditPayload` envelope that crosses the async queue boundary
//! - The persisted `AuditRecord` entity
//! - The explicit per-request `AuditContext`
//! - ID prefix constants and cross-cutting error types

pub mod catalog;
pub mod change_set;
pub mod context;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod payload;
pub mod row;
