pub mod log_format;

pub use log_format::{compress_role_set, preview_compact};
