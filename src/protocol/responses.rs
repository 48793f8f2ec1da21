//! Response handling
//!
//! Defines HTTP status codes, JSON bodies and cookie directives returned to
//! the host web framework.

use cookie::time::Duration as CookieDuration;
use cookie::{Cookie, SameSite};
use serde::Serialize;
use serde_json::{Value, json};

use crate::auth::Role;
use crate::error::{AuthError, StorageError};
use crate::storage::{DirectoryEntry, UploadReport};

/// HTTP status codes used by the drive
pub const OK: u16 = 200;
pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;
pub const FORBIDDEN: u16 = 403;
pub const NOT_FOUND: u16 = 404;
pub const PAYLOAD_TOO_LARGE: u16 = 413;
pub const UNSUPPORTED_MEDIA_TYPE: u16 = 415;
pub const INTERNAL_ERROR: u16 = 500;

/// What the host should send back
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub body: ResponseBody,
    pub cookie: Option<CookieDirective>,
}

#[derive(Debug)]
pub enum ResponseBody {
    Json(Value),
    File(FileResponse),
}

/// An opened file to stream as an attachment
#[derive(Debug)]
pub struct FileResponse {
    pub file: tokio::fs::File,
    pub file_name: String,
    pub size: u64,
}

impl FileResponse {
    /// Value for the `Content-Disposition` header
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename=\"{}\"",
            encode_uri_component(&self.file_name)
        )
    }
}

/// Cookie change the host must apply to the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieDirective {
    Set {
        name: String,
        value: String,
        max_age_secs: u64,
    },
    Clear {
        name: String,
    },
}

impl CookieDirective {
    /// A cookie carrying `value`, rejected if the value would not survive
    /// as a single `Set-Cookie` value.
    pub fn set(
        name: impl Into<String>,
        value: impl Into<String>,
        max_age_secs: u64,
    ) -> Result<Self, AuthError> {
        let directive = CookieDirective::Set {
            name: name.into(),
            value: value.into(),
            max_age_secs,
        };
        directive.to_cookie()?;
        Ok(directive)
    }

    /// The cookie to send, with the same path and flags for set and clear.
    pub fn to_cookie(&self) -> Result<Cookie<'static>, AuthError> {
        match self {
            CookieDirective::Set {
                name,
                value,
                max_age_secs,
            } => {
                if !is_cookie_value(value) {
                    return Err(AuthError::IssueFailed(
                        "credential is not a valid cookie value".into(),
                    ));
                }
                let max_age = i64::try_from(*max_age_secs).unwrap_or(i64::MAX);
                Ok(Cookie::build((name.clone(), value.clone()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .max_age(CookieDuration::seconds(max_age))
                    .build())
            }
            CookieDirective::Clear { name } => {
                let mut cookie = Cookie::build((name.clone(), String::new()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .build();
                cookie.make_removal();
                Ok(cookie)
            }
        }
    }

    /// Value for the `Set-Cookie` header
    pub fn header_value(&self) -> Result<String, AuthError> {
        Ok(self.to_cookie()?.to_string())
    }
}

/// `cookie-octet` from RFC 6265: no whitespace, quotes, commas, semicolons
/// or backslashes.
fn is_cookie_value(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E))
}

impl Response {
    pub fn json(status: u16, body: &impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => Self {
                status,
                body: ResponseBody::Json(value),
                cookie: None,
            },
            Err(e) => {
                log::error!("Failed to serialize response body: {}", e);
                Self::error(INTERNAL_ERROR, "Internal server error")
            }
        }
    }

    pub fn ok() -> Self {
        Self::json(OK, &OkBody { ok: true })
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            status,
            body: ResponseBody::Json(json!({ "error": message })),
            cookie: None,
        }
    }

    pub fn file(file: FileResponse) -> Self {
        Self {
            status: OK,
            body: ResponseBody::File(file),
            cookie: None,
        }
    }

    pub fn with_cookie(mut self, cookie: CookieDirective) -> Self {
        self.cookie = Some(cookie);
        self
    }

    /// JSON body, if this is not a file response
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::File(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OkBody {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ListBody<'a> {
    pub path: &'a str,
    pub items: &'a [DirectoryEntry],
}

#[derive(Debug, Serialize)]
pub struct ReadBody<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RejectedUpload {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct UploadBody {
    pub ok: bool,
    pub uploaded: Vec<String>,
    pub rejected: Vec<RejectedUpload>,
}

impl UploadBody {
    pub fn from_report(report: UploadReport, describe: impl Fn(StorageError) -> String) -> Self {
        Self {
            ok: true,
            uploaded: report.saved,
            rejected: report
                .rejected
                .into_iter()
                .map(|r| RejectedUpload {
                    name: r.name,
                    error: describe(r.error),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginBody {
    pub ok: bool,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct WhoAmIBody {
    pub role: Role,
}

/// Percent-encodes everything except the characters JavaScript's
/// `encodeURIComponent` leaves alone.
pub fn encode_uri_component(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => encoded.push(byte as char),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("report.pdf"), "report.pdf");
        assert_eq!(encode_uri_component("my file\".txt"), "my%20file%22.txt");
        assert_eq!(encode_uri_component("résumé.md"), "r%C3%A9sum%C3%A9.md");
    }

    #[test]
    fn test_error_body_shape() {
        let response = Response::error(NOT_FOUND, "Not found");
        assert_eq!(response.status, 404);
        assert_eq!(response.json_body().unwrap()["error"], "Not found");
    }

    #[test]
    fn test_cookie_header_values() {
        let set = CookieDirective::set("token", "abc.def-123", 604_800).unwrap();
        let header = set.header_value().unwrap();
        let parsed = Cookie::parse(header.as_str()).unwrap();
        assert_eq!(parsed.name(), "token");
        assert_eq!(parsed.value(), "abc.def-123");
        assert_eq!(parsed.path(), Some("/"));
        assert_eq!(parsed.http_only(), Some(true));
        assert_eq!(parsed.same_site(), Some(SameSite::Lax));
        assert_eq!(parsed.max_age(), Some(CookieDuration::seconds(604_800)));

        let clear = CookieDirective::Clear { name: "token".into() };
        let header = clear.header_value().unwrap();
        let parsed = Cookie::parse(header.as_str()).unwrap();
        assert_eq!(parsed.name(), "token");
        assert_eq!(parsed.value(), "");
        assert_eq!(parsed.path(), Some("/"));
        assert_eq!(parsed.max_age(), Some(CookieDuration::ZERO));
    }

    #[test]
    fn test_cookie_value_cannot_inject_attributes() {
        for value in ["abc; Domain=evil.example", "a b", "a,b", "\"quoted\"", "back\\slash", ""] {
            assert!(
                matches!(
                    CookieDirective::set("token", value, 60),
                    Err(AuthError::IssueFailed(_))
                ),
                "{value:?}"
            );
        }

        let forged = CookieDirective::Set {
            name: "token".into(),
            value: "abc; Domain=evil.example".into(),
            max_age_secs: 1,
        };
        assert!(forged.header_value().is_err());
    }
}
