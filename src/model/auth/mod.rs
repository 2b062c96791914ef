//! Caller identity and rights.
//!
//! Tokens are issued elsewhere; this module only verifies them and decides
//! what the bearer may do.

mod caller;
mod role;
mod token;

pub use caller::{Caller, ReadAccess};
pub use role::Role;
pub use token::{Claims, AUTH_TOKEN_COOKIE};
