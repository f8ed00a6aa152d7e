//! Orders Storage — PostgreSQL persistence for orders.

pub mod pg_order_repository;
pub mod schema;

pub use pg_order_repository::PgOrderRepository;
