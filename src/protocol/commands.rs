//! Module `commands`
//!
//! Defines the requests the drive understands, already decoded by the host
//! web framework, and the JSON payloads they are deserialized from.

use serde::Deserialize;

use crate::storage::UploadItem;

/// A decoded drive request.
///
/// Each variant corresponds to one endpoint of the HTTP surface.
#[derive(Debug, Clone)]
pub enum Request {
    /// GET /api/list?path=
    List { path: Option<String> },
    /// GET /api/download?path=
    Download { path: String },
    /// GET /api/read?path=
    Read { path: String },
    /// POST /api/write
    Write { path: String, content: String },
    /// POST /api/mkdir
    Mkdir { path: Option<String>, name: String },
    /// POST /api/rename
    Rename { path: String, new_name: String },
    /// DELETE /api/delete?path=
    Delete { path: String },
    /// POST /api/upload?path=
    Upload { path: String, items: Vec<UploadItem> },
    /// POST /api/login
    Login { username: String, password: String },
    /// POST /api/logout
    Logout,
    /// GET /api/whoami
    WhoAmI,
}

impl Request {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Request::List { .. } => "list",
            Request::Download { .. } => "download",
            Request::Read { .. } => "read",
            Request::Write { .. } => "write",
            Request::Mkdir { .. } => "mkdir",
            Request::Rename { .. } => "rename",
            Request::Delete { .. } => "delete",
            Request::Upload { .. } => "upload",
            Request::Login { .. } => "login",
            Request::Logout => "logout",
            Request::WhoAmI => "whoami",
        }
    }

    /// Whether the request changes the storage tree
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Request::Write { .. }
                | Request::Mkdir { .. }
                | Request::Rename { .. }
                | Request::Delete { .. }
                | Request::Upload { .. }
        )
    }

    /// The virtual path the request is about, if any
    pub fn target_path(&self) -> Option<&str> {
        match self {
            Request::List { path } | Request::Mkdir { path, .. } => {
                Some(path.as_deref().unwrap_or("/"))
            }
            Request::Download { path }
            | Request::Read { path }
            | Request::Write { path, .. }
            | Request::Rename { path, .. }
            | Request::Delete { path }
            | Request::Upload { path, .. } => Some(path),
            Request::Login { .. } | Request::Logout | Request::WhoAmI => None,
        }
    }
}

/// Body of POST /api/write
#[derive(Debug, Deserialize)]
pub struct WritePayload {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// Body of POST /api/mkdir
#[derive(Debug, Deserialize)]
pub struct MkdirPayload {
    pub path: Option<String>,
    #[serde(default)]
    pub name: String,
}

/// Body of POST /api/rename
#[derive(Debug, Deserialize)]
pub struct RenamePayload {
    #[serde(default)]
    pub path: String,
    #[serde(rename = "newName", default)]
    pub new_name: String,
}

/// Body of POST /api/login
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl From<WritePayload> for Request {
    fn from(body: WritePayload) -> Self {
        Request::Write {
            path: body.path,
            content: body.content,
        }
    }
}

impl From<MkdirPayload> for Request {
    fn from(body: MkdirPayload) -> Self {
        Request::Mkdir {
            path: body.path,
            name: body.name,
        }
    }
}

impl From<RenamePayload> for Request {
    fn from(body: RenamePayload) -> Self {
        Request::Rename {
            path: body.path,
            new_name: body.new_name,
        }
    }
}

impl From<LoginPayload> for Request {
    fn from(body: LoginPayload) -> Self {
        Request::Login {
            username: body.username,
            password: body.password,
        }
    }
}
