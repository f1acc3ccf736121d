//! Database models split into separate files.
//! This module re-exports individual model modules so imports like
//! `use crate::db::models::*;` work across the crate.

pub mod category;
pub mod gift;
pub mod giver;
pub mod user;

pub use self::category::*;
pub use self::gift::*;
pub use self::giver::*;
pub use self::user::*;
