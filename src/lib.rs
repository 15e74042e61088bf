//! Postgres Driver

mod common;
mod io;
mod net;
mod ext;

// Protocol
pub mod postgres;

// Codec
mod value;
mod encode;
mod column;
pub mod decode;
pub mod types;

// Component
mod statement;
mod row;

// Connection
mod transport;
mod connection;
mod executor;
pub mod pool;
mod transaction;

// Operation
pub mod query;

mod error;


pub use encode::{Encode, Encoded};
pub use column::{Column, ColumnInfo, Index};
pub use decode::Decode;
pub use row::{FromRow, Row};

pub use connection::{Config, PgConnection};
pub use executor::Executor;
pub use pool::{Pool, PoolConfig};
pub use transaction::{Savepoint, Transaction, begin};
pub use query::query;
pub use statement::{PreparedStatement, prepare};
pub use types::{Cidr, PgInterval};

pub use postgres::{DatabaseError, ProtocolError, ErrorResponse, NoticeResponse};
pub use error::{Error, Result};

