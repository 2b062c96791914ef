use rocket::{
    http::Status,
    response::{self, status, Responder},
    serde::json::Json,
    Request,
};
use serde::{Deserialize, Serialize};

/// Standard wrapper around every successful response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    pub message: String,
    pub status: u16,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            status: Status::Ok.code,
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            status: Status::Created.code,
        }
    }
}

impl Envelope<()> {
    /// A response with `"data": null`.
    pub fn empty(message: impl Into<String>) -> Self {
        Self::ok((), message)
    }
}

impl<'r, 'o: 'r, T> Responder<'r, 'o> for Envelope<T>
where
    T: Serialize,
{
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = Status::from_code(self.status).unwrap_or(Status::Ok);
        status::Custom(status, Json(self)).respond_to(req)
    }
}
