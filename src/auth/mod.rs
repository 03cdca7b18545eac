//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! POST /auth/login | /auth/register
//!     → handlers.rs (field checks, HTTP mapping)
//!     → users.rs (credential store) / saga client (registration)
//!     → token.rs (sign session token)
//!     → session cookie + JSON response
//!
//! every other path
//!     → identity.rs (resolve caller, downgrade to anonymous on failure)
//!     → proxy forwarder (identity header injection)
//! ```

pub mod handlers;
pub mod identity;
pub mod token;
pub mod users;

pub use identity::{Identity, IDENTITY_HEADER};
pub use token::{SessionClaims, TokenService};
pub use users::{User, UserServiceClient};
