//! Request handlers module for the drive.
//!
//! Applies the admin gate, runs the storage operation off the async runtime
//! and turns the outcome into a [`Response`].

use crate::auth::{Role, require_admin, validate_login};
use crate::error::handlers::handle_error;
use crate::error::{
    AuthError, DriveError, DriveResult, StorageError, client_message, error_to_status,
};
use crate::middleware::logging::{log_request, log_response};
use crate::protocol::commands::Request;
use crate::protocol::responses::{
    BAD_REQUEST, CookieDirective, FileResponse, ListBody, LoginBody, OK, ReadBody, Response,
    UploadBody, WhoAmIBody,
};
use crate::server::Drive;
use crate::storage::{
    UploadItem, delete_entry, list_directory, make_directory, prepare_download,
    read_text_file, rename_entry, save_uploads, write_text_file,
};
use log::info;

/// Dispatches a decoded request on behalf of the holder of `credential`.
///
/// `credential` is the raw value of the token cookie, if any. Never fails:
/// every error becomes a status code and a short message.
pub async fn handle_request(drive: &Drive, credential: Option<&str>, request: Request) -> Response {
    let role = drive.role_for(credential);
    log_request(role, &request);

    let name = request.name();
    let response = match dispatch(drive, role, request).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    };

    log_response(name, response.status);
    response
}

async fn dispatch(drive: &Drive, role: Role, request: Request) -> DriveResult<Response> {
    if request.requires_admin() {
        require_admin(role)?;
    }

    match request {
        Request::List { path } => handle_list(drive, path).await,
        Request::Download { path } => handle_download(drive, path).await,
        Request::Read { path } => handle_read(drive, path).await,
        Request::Write { path, content } => handle_write(drive, path, content).await,
        Request::Mkdir { path, name } => handle_mkdir(drive, path, name).await,
        Request::Rename { path, new_name } => handle_rename(drive, path, new_name).await,
        Request::Delete { path } => handle_delete(drive, path).await,
        Request::Upload { path, items } => handle_upload(drive, path, items).await,
        Request::Login { username, password } => handle_login(drive, &username, &password),
        Request::Logout => Ok(handle_logout(drive)),
        Request::WhoAmI => Ok(Response::json(OK, &WhoAmIBody { role })),
    }
}

fn error_response(err: &DriveError) -> Response {
    handle_error(err);
    Response::error(error_to_status(err), client_message(err))
}

async fn handle_list(drive: &Drive, path: Option<String>) -> DriveResult<Response> {
    let path = path.unwrap_or_else(|| "/".to_string());
    let virtual_path = path.clone();
    let items = drive
        .run_blocking(move |d| list_directory(d.resolver(), &virtual_path))
        .await?;

    Ok(Response::json(
        OK,
        &ListBody {
            path: &path,
            items: &items,
        },
    ))
}

async fn handle_download(drive: &Drive, path: String) -> DriveResult<Response> {
    let target = drive
        .run_blocking(move |d| prepare_download(d.resolver(), &path))
        .await?;

    let file = tokio::fs::File::open(&target.file_path)
        .await
        .map_err(|e| StorageError::io(target.virtual_path.clone(), e))?;

    Ok(Response::file(FileResponse {
        file,
        file_name: target.file_name,
        size: target.size,
    }))
}

async fn handle_read(drive: &Drive, path: String) -> DriveResult<Response> {
    let virtual_path = path.clone();
    let content = drive
        .run_blocking(move |d| read_text_file(d.resolver(), d.config(), &virtual_path))
        .await?;

    Ok(Response::json(
        OK,
        &ReadBody {
            path: &path,
            content: &content,
        },
    ))
}

async fn handle_write(drive: &Drive, path: String, content: String) -> DriveResult<Response> {
    drive
        .run_blocking(move |d| write_text_file(d.resolver(), d.config(), &path, &content))
        .await?;
    Ok(Response::ok())
}

async fn handle_mkdir(drive: &Drive, path: Option<String>, name: String) -> DriveResult<Response> {
    let parent = path.unwrap_or_else(|| "/".to_string());
    drive
        .run_blocking(move |d| make_directory(d.resolver(), &parent, &name))
        .await?;
    Ok(Response::ok())
}

async fn handle_rename(drive: &Drive, path: String, new_name: String) -> DriveResult<Response> {
    drive
        .run_blocking(move |d| rename_entry(d.resolver(), &path, &new_name))
        .await?;
    Ok(Response::ok())
}

async fn handle_delete(drive: &Drive, path: String) -> DriveResult<Response> {
    // Runs to completion even if the caller stops waiting.
    drive
        .run_blocking(move |d| delete_entry(d.resolver(), &path))
        .await?;
    Ok(Response::ok())
}

async fn handle_upload(
    drive: &Drive,
    path: String,
    items: Vec<UploadItem>,
) -> DriveResult<Response> {
    let outcome = drive
        .run_blocking(move |d| save_uploads(d.resolver(), d.config(), &path, &items))
        .await;

    let report = match outcome {
        Ok(report) => report,
        Err(DriveError::Storage(StorageError::NotFound(_) | StorageError::NotADirectory(_))) => {
            return Ok(Response::error(BAD_REQUEST, "Target directory not found"));
        }
        Err(e) => return Err(e),
    };

    Ok(Response::json(
        OK,
        &UploadBody::from_report(report, |e| client_message(&DriveError::Storage(e))),
    ))
}

fn handle_login(drive: &Drive, username: &str, password: &str) -> DriveResult<Response> {
    let config = drive.config();
    validate_login(username, password, config)?;

    let issuer = drive
        .issuer()
        .ok_or_else(|| AuthError::IssueFailed("login is not enabled".into()))?;
    let token = issuer.issue(Role::Admin, username, config.token_ttl())?;
    let cookie = CookieDirective::set(&config.token_cookie_name, token, config.token_ttl_secs)?;

    info!("Administrator {} logged in", username);

    Ok(Response::json(
        OK,
        &LoginBody {
            ok: true,
            role: Role::Admin,
        },
    )
    .with_cookie(cookie))
}

fn handle_logout(drive: &Drive) -> Response {
    Response::ok().with_cookie(CookieDirective::Clear {
        name: drive.config().token_cookie_name.clone(),
    })
}
