pub mod error;
pub mod pattern;
pub mod raw_response;
pub mod search_result;

pub use error::*;
pub use pattern::*;
pub use raw_response::*;
pub use search_result::*;
