pub mod db;
pub mod error;
pub mod sessions;
pub mod types;
pub mod users;

pub use error::{Result, UserError};
pub use sessions::{session_ttl, SessionManager};
pub use types::{IssuedSession, User};
pub use users::UserDirectory;
