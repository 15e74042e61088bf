//! Codecs for postgres types beyond the scalar/bytea/json set covered directly in
//! [`decode`][crate::decode] and [`encode`][crate::encode].
//!
//! Available for:
//!
//! - [`time`][::time]'s [`Date`][td], [`Time`][tt], [`PrimitiveDateTime`][tp] and
//!   [`UtcDateTime`][tu] (`date`, `time`, `timestamp`, `timestamptz`), requires the `time`
//!   feature
//! - [`std::net::IpAddr`] (`inet`) and [`Cidr`] (`cidr`)
//! - [`PgInterval`] (`interval`)
//! - `Vec<T>` (one dimensional array types) for every scalar/text `T` this crate already
//!   decodes/encodes, except `Vec<u8>` which already means `bytea`
//!
//! [td]: ::time::Date
//! [tt]: ::time::Time
//! [tp]: ::time::PrimitiveDateTime
//! [tu]: ::time::UtcDateTime

#[cfg(feature = "time")]
mod time;

mod network;
pub use network::Cidr;

mod interval;
pub use interval::PgInterval;

mod array;
