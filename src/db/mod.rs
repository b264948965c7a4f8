//! Database access layer

pub mod analytics;
pub mod carts;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

/// Whether a sqlx error is a Postgres unique-constraint violation
///
/// Used to turn racing inserts into a deterministic conflict response
/// instead of a generic failure.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
