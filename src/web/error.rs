//! JSON error rendering for the API.

use actix_web::dev::ServiceResponse;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, Result};
use serde::Serialize;

#[derive(Serialize)]
struct ErrorBody {
    message: &'static str,
}

/// Replace any 500 body with a fixed JSON message. Whatever actually failed
/// has already been written to the server log by the handler.
pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    let res = HttpResponse::InternalServerError().json(ErrorBody {
        message: "Internal server error",
    });
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, res).map_into_right_body(),
    ))
}
