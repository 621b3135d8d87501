//! Session API request/response types and dispatch.
//!
//! Transport-agnostic: the embedding server turns an HTTP exchange into an
//! [`ApiRequest`] and writes the returned [`ApiResponse`] back out.

pub mod request;
pub mod response;
pub mod router;

pub use request::{ApiRequest, CreateImageBody, Method};
pub use response::{ApiResponse, CORS_HEADERS, CreateImageResponse, ErrorBody, GetImageResponse};
pub use router::{IMAGE_PATH, handle};
