pub mod archive;
pub mod client;
pub mod error;
pub mod import;
pub mod report;
pub mod response;
pub mod sink;

pub use error::{ImportError, Result};
