//! Client-side session layer consumed by the mobile shell: secure on-device
//! persistence of the token, user record, and role, plus the app-lifetime
//! session state with login/logout/restore operations.

pub mod session;
pub mod store;

pub use session::SessionContext;
pub use store::{FileSessionStore, SessionStore};
