pub mod error;
pub mod types;

pub use error::{LookupError, RecordError, TransportError};
pub use types::{DownloadSelector, FieldMap, FieldValue};
