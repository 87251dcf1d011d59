use std::sync::Arc;

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::{self, Json};
use rocket::{catch, catchers, post, routes, Build, Request, Rocket, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::actions::PlaylistSync;
use crate::caller::{require_caller, Authenticator, Caller};
use crate::error::{CallError, ErrorCode};
use crate::models::record::PlaylistSummary;

/// Request envelope of the callable protocol.
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct CallResult<T> {
    pub result: T,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: ErrorCode,
    message: String,
}

impl<'r> Responder<'r, 'static> for CallError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = Status::new(self.code.http_status());
        let body = ErrorEnvelope {
            error: ErrorBody {
                status: self.code,
                message: self.message,
            },
        };
        (status, Json(body)).respond_to(req)
    }
}

type CallResponse<T> = Result<Json<CallResult<T>>, CallError>;

/// Authentication is checked before the body, so an anonymous caller never
/// learns whether their payload would have parsed.
fn request_data(
    caller: Option<&Caller>,
    body: Result<Json<CallRequest>, json::Error<'_>>,
) -> Result<Value, CallError> {
    require_caller(caller)?;
    match body {
        Ok(body) => Ok(body.into_inner().data),
        Err(err) => Err(CallError::invalid_argument(format!(
            "Invalid request body: {err}"
        ))),
    }
}

#[post("/add_playlist", data = "<body>")]
pub async fn add_playlist(
    sync: &State<PlaylistSync>,
    caller: Option<Caller>,
    body: Result<Json<CallRequest>, json::Error<'_>>,
) -> CallResponse<String> {
    let data = request_data(caller.as_ref(), body)?;
    let result = sync.add_playlist(caller.as_ref(), &data).await?;
    Ok(Json(CallResult { result }))
}

#[post("/update_all_folders")]
pub async fn update_all_folders(
    sync: &State<PlaylistSync>,
    caller: Option<Caller>,
) -> CallResponse<String> {
    let result = sync.update_all_folders(caller.as_ref()).await?;
    Ok(Json(CallResult { result }))
}

#[post("/search_playlists", data = "<body>")]
pub async fn search_playlists(
    sync: &State<PlaylistSync>,
    caller: Option<Caller>,
    body: Result<Json<CallRequest>, json::Error<'_>>,
) -> CallResponse<Vec<PlaylistSummary>> {
    let data = request_data(caller.as_ref(), body)?;
    let result = sync.search_playlists(caller.as_ref(), &data).await?;
    Ok(Json(CallResult { result }))
}

#[catch(404)]
fn not_found(req: &Request<'_>) -> CallError {
    CallError::new(ErrorCode::NotFound, format!("No such function: {}", req.uri()))
}

#[catch(default)]
fn default_catcher(status: Status, _req: &Request<'_>) -> CallError {
    let code = match status.code {
        401 => ErrorCode::Unauthenticated,
        400..=499 => ErrorCode::InvalidArgument,
        _ => ErrorCode::Internal,
    };
    CallError::new(code, status.reason_lossy())
}

pub fn build(sync: PlaylistSync, authenticator: Arc<dyn Authenticator>) -> Rocket<Build> {
    build_with(rocket::build(), sync, authenticator)
}

pub fn build_with(
    rocket: Rocket<Build>,
    sync: PlaylistSync,
    authenticator: Arc<dyn Authenticator>,
) -> Rocket<Build> {
    rocket
        .manage(sync)
        .manage(authenticator)
        .mount(
            "/",
            routes![add_playlist, update_all_folders, search_playlists],
        )
        .register("/", catchers![not_found, default_catcher])
}
