//! Drive request protocol
//!
//! The contract between the host web framework and the drive: decoded
//! requests in, status codes and bodies out.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{LoginPayload, MkdirPayload, RenamePayload, Request, WritePayload};
pub use handlers::handle_request;
pub use responses::{CookieDirective, FileResponse, Response, ResponseBody};
