//! In-memory editing state: one session per loaded image.

mod session;

pub use session::{ImageSession, SessionError, SessionStore};
