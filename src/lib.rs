pub mod encoding;
pub mod bitfield;
pub mod skylink;
pub mod response;
pub mod path;
pub mod options;

pub use bitfield::{Bitfield, BitfieldError};
pub use skylink::{Skylink, SkylinkError};
pub use response::{UploadResponse, ResponseError, validate_response};
pub use options::{UploadOptions, MultiFileUploadOptions};
