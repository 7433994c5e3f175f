pub mod audit;
pub mod dispatch;
pub mod entity;
pub mod schema;
pub mod shared;
