mod error;
mod handler;
mod router;

pub use error::{ApiError, ApiErrorCode, recover_error};
pub use handler::{ApiResponse, SendRequestBody};
pub use router::routes;

use crate::server::Server;
use std::sync::Arc;
use warp::Filter;

/// The v1 routes under `/api/v1`, with rejections turned into envelopes.
pub fn api(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(routes(server))
        .recover(recover_error)
}
