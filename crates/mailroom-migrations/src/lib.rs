//! Database migrations for Mailroom

mod migration;

pub use migration::Migrator;
pub use sea_orm_migration::prelude::*;
