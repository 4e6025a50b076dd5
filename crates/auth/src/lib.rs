//! Session tokens and the trusted clock that judges their expiry.
//!
//! The local clock is never consulted for expiry: [`TokenManager`] asks a
//! [`TimeSource`] (in production an ordered list of NTP servers) for the
//! current time and compares it with the token's unverified `exp` claim.

pub mod error;
pub mod time;
pub mod token;

pub use error::AuthError;
pub use time::{DEFAULT_NTP_SERVERS, NtpTimeSource, TimeSource};
pub use token::{DEFAULT_MARGIN, SessionToken, TokenManager, is_expired};
