//! PostgreSQL persistence adapters built on Diesel, `diesel-async` and bb8.
//!
//! Repositories only translate between row structs and domain records;
//! `schema` and `models` stay private to this module.
//!
//! ```ignore
//! use routeshare::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/routeshare")).await?;
//! let users = DieselUserRepository::new(pool.clone());
//! ```

mod diesel_error_mapping;
mod diesel_route_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_route_repository::DieselRouteRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::run_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};
