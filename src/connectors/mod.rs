//! External service connectors.
//!
//! Each connector is a thin typed wrapper over a remote HTTP API: the hosted
//! connector token exchange, the GitHub contents API used as the JSON store,
//! and the Microsoft Graph workbook endpoint used for attendance data.

pub mod auth;
pub mod github;
pub mod graph;

pub use auth::TokenProvider;
pub use github::{FileStore, GitHubFileStore, MemoryFileStore, StoredFile};
pub use graph::{AttendanceStats, GraphClient};
