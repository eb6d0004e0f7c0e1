//! SeaORM entities backing the user/role store and the product catalog,
//! plus the field-level validation helpers shared by every write path.

pub mod errors;
pub mod db;
pub mod product;
pub mod role;
pub mod user;
