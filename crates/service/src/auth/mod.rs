//! Auth module: domain, repository, and the services built on them.
//!
//! - `password`: salted argon2 hashing and verification
//! - `token`: HS256 issuance with a bounded signing time, and verification
//! - `roles`: role claim → role name, by name or by id lookup
//! - `gate`: allow-list authorization of a presented token
//! - `service` / `profile`: login, registration, self-service updates

pub mod domain;
pub mod errors;
pub mod gate;
pub mod password;
pub mod profile;
pub mod repository;
pub mod repo;
pub mod roles;
pub mod service;
pub mod token;

pub use gate::{GateDecision, Rejection, RoleGate};
pub use profile::ProfileService;
pub use roles::RoleResolver;
pub use service::{AuthService, AuthSettings};
pub use token::{Claims, TokenService};
