/*!
 * SQLite persistence for dictionary results (per surface form) and raw
 * subtitle tracks (per content id and language).
 */

pub mod schema;
pub mod connection;
pub mod repository;
pub mod models;

pub use connection::DatabaseConnection;
pub use repository::Repository;
