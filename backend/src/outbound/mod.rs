//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: mutex-guarded repositories for development and tests
//! - **argon2_hasher**: Argon2id password hashing
//! - **mail**: SendGrid and logging mailers
//! - **report**: PDF rendering and report file storage
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod argon2_hasher;
pub mod mail;
pub mod memory;
pub mod persistence;
pub mod report;

pub use argon2_hasher::Argon2PasswordHasher;
pub use memory::InMemoryStore;
