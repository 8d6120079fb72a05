// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Identity & session guard: bearer tokens resolving to user identities.

pub mod extract;
pub mod password;
pub mod session;

pub use extract::CurrentUser;
pub use password::{hash_password, verify_password};
pub use session::{Session, SessionManager};
