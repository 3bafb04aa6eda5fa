mod credentials;
mod password;
mod session;

pub use credentials::{bearer_token, Credentials};
pub use password::{hash_password, validate_credentials};
pub use session::{AdminSession, SessionClaims, SessionTtl};
