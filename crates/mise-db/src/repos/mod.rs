//! Repository modules.
//!
//! Each module adds methods to `MiseDb` via `impl MiseDb` blocks.

pub mod audit;
pub mod entity;

pub use audit::AuditFilter;
