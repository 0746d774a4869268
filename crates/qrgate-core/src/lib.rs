pub mod constants;
pub mod error;
pub mod roles;
pub mod types;

pub use error::{ApiOperation, Error, Result};
pub use roles::RoleCode;
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
