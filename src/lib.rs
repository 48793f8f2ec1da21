//! Cloud Drive core
//!
//! A personal file-storage service core: an administrator manages a
//! sandboxed storage tree, guests browse and download it. The host web
//! framework decodes requests, hands them to [`Drive::handle`] together with
//! the raw credential cookie, and writes the returned [`Response`] back.

pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod storage;
pub mod utils;

pub use auth::{CredentialVerifier, Role, StaticTokenAuthority, TokenIssuer};
pub use config::DriveConfig;
pub use error::{AuthError, DriveError, StorageError};
pub use protocol::{Request, Response, ResponseBody};
pub use server::Drive;
pub use storage::{DirectoryEntry, EntryKind, PathResolver, UploadItem};
