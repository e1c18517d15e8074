pub mod json;
pub mod path;
pub mod response;

pub use json::JsonBody;
pub use path::PathId;
pub use response::{ApiResponse, ApiResult};
