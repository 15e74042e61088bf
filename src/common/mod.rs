//! Supporting utility types.

mod bytestr;
mod general;
mod url;

pub use bytestr::ByteStr;
pub use general::GeneralError;
pub use url::{ParseError, Url};

/// Type erased error, for error sources whose concrete type the caller does not need.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

macro_rules! trace {
    ($($tt:tt)*) => {
        #[cfg(feature = "log-verbose")] log::trace!($($tt)*)
    };
}

pub(crate) use trace;

/// Hash a cleartext password the way postgres' `md5` authentication method expects:
/// `"md5" + hex(md5(hex(md5(password + username)) + salt))`.
///
/// <https://www.postgresql.org/docs/current/auth-password.html>
pub(crate) fn md5_password(user: &str, password: &str, salt: [u8; 4]) -> String {
    let inner = md5::compute([password.as_bytes(), user.as_bytes()].concat());
    let mut outer_input = format!("{inner:x}").into_bytes();
    outer_input.extend_from_slice(&salt);
    let outer = md5::compute(outer_input);
    format!("md5{outer:x}")
}
