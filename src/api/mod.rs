use rocket::{
    http::Status,
    response::status,
    serde::json::{json, Json, Value},
    Catcher, Request, Route,
};

use crate::error::ErrorBody;

mod candidates;
mod positions;
mod results;
mod votes;

pub fn routes() -> Vec<Route> {
    let mut routes = routes![health];
    routes.extend(positions::routes());
    routes.extend(candidates::routes());
    routes.extend(votes::routes());
    routes.extend(results::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![default_catcher]
}

#[get("/health")]
fn health() -> Value {
    json!({ "status": "ok" })
}

/// Render failures that never reached a handler (bad tokens, malformed
/// bodies, unknown routes) with the same body as handler errors.
///
/// Unparseable bodies are reported as 400 rather than Rocket's 422.
#[catch(default)]
fn default_catcher(status: Status, req: &Request<'_>) -> status::Custom<Json<ErrorBody>> {
    let (status, body) = match status.code {
        400 | 422 => (
            Status::BadRequest,
            ErrorBody::new("ValidationError", "Malformed request"),
        ),
        401 => (
            status,
            ErrorBody::new("AuthorizationError", "Missing or invalid bearer token"),
        ),
        403 => (status, ErrorBody::new("AuthorizationError", "Forbidden")),
        404 => (
            status,
            ErrorBody::new("NotFoundError", format!("Nothing at {}", req.uri().path())),
        ),
        405..=499 => (
            status,
            ErrorBody::new("ValidationError", status.reason_lossy()),
        ),
        _ => (status, ErrorBody::new("InternalError", "Internal server error")),
    };
    status::Custom(status, Json(body))
}
