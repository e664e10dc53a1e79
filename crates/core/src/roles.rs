//! Well-known user role and status values.
//!
//! These must match the column defaults in `20260101000001_create_users_table.sql`.

pub const ROLE_ADMIN: i16 = 0;
pub const ROLE_USER: i16 = 1;

pub const STATUS_INACTIVE: i16 = 0;
pub const STATUS_ACTIVE: i16 = 1;
