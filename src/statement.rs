//! Naming for server side prepared statements, portals and savepoints.
//!
//! Names are drawn from independent per-kind monotonic counters so that concurrent
//! connections never collide with a name another connection picked, and so a cached
//! statement keeps the same name for as long as it lives in the cache.
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

static STATEMENT_COUNTER: AtomicU64 = AtomicU64::new(0);
static PORTAL_COUNTER: AtomicU64 = AtomicU64::new(0);
static SAVEPOINT_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Clone, PartialEq, Eq)]
enum Name {
    /// The empty string selects the unnamed prepared statement/portal.
    Unnamed,
    Owned(std::sync::Arc<str>),
}

impl Name {
    fn next(prefix: &str, counter: &AtomicU64) -> Self {
        let id = counter.fetch_add(1, Ordering::Relaxed);
        Self::Owned(format!("{prefix}{id}").into())
    }

    fn as_str(&self) -> &str {
        match self {
            Name::Unnamed => "",
            Name::Owned(name) => name,
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

macro_rules! name_kind {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(Name);

        impl $name {
            /// Allocate the next name in this kind's monotonic sequence.
            pub(crate) fn next() -> Self {
                Self(Name::next($prefix, &CONCAT_COUNTER!($name)))
            }

            /// The unnamed (empty string) variant.
            pub(crate) fn unnamed() -> Self {
                Self(Name::Unnamed)
            }

            /// The wire representation: empty string for the unnamed variant.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

// small helper so `name_kind!` can reference the right static per invocation
macro_rules! CONCAT_COUNTER {
    (StatementName) => {
        STATEMENT_COUNTER
    };
    (PortalName) => {
        PORTAL_COUNTER
    };
    (SavepointName) => {
        SAVEPOINT_COUNTER
    };
}

name_kind!(
    /// Name of a server side prepared statement.
    StatementName, "qs_stmt_"
);

name_kind!(
    /// Name of a server side portal.
    PortalName, "qs_portal_"
);

name_kind!(
    /// Name of a `SAVEPOINT`.
    SavepointName, "qs_sp_"
);

use crate::{
    Result,
    postgres::{backend, frontend},
    query::{Query, ops::check_sql},
    transport::{PgTransport, PgTransportExt},
};

/// A SQL statement already `Parse`d on the server, identified by name rather than its full
/// text on the wire.
///
/// Preparing ahead of time (rather than relying on the implicit cache every [`query`] call
/// already consults) is useful to surface a syntax error before the statement is first run, or
/// to warm the cache on a freshly opened connection before traffic hits it.
///
/// [`query`]: crate::query::query
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    sql: std::sync::Arc<str>,
    name: StatementName,
}

impl PreparedStatement {
    /// The SQL text this statement was prepared from.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The server-side name this statement was parsed under.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Build a [`Query`] against this statement's text, reusing the cached name on `io`
    /// instead of re-parsing, provided `io` is the same connection (or shares the same
    /// statement cache) it was prepared on.
    pub fn query<'s, IO: PgTransport>(&'s self, io: IO) -> Query<'s, 's, IO> {
        crate::query::query(&self.sql, io)
    }
}

/// Prepare `sql` on the server ahead of time, caching it on `io` under the hash of its text so
/// a later [`query`][crate::query::query] call against the same connection reuses it.
///
/// A cache hit (the connection already knows this statement) returns immediately without a
/// round trip.
pub async fn prepare<IO: PgTransport>(sql: &str, mut io: IO) -> Result<PreparedStatement> {
    check_sql(sql)?;

    let sqlid = {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::hash::DefaultHasher::new();
        sql.hash(&mut hasher);
        hasher.finish()
    };

    if let Some(name) = io.get_stmt(sqlid) {
        return Ok(PreparedStatement { sql: sql.into(), name });
    }

    let name = StatementName::next();

    io.send(frontend::Parse {
        prepare_name: name.as_str(),
        sql,
        oids_len: 0,
        oids: std::iter::empty(),
    });
    io.send(frontend::Sync);
    io.flush().await?;

    io.recv::<backend::ParseComplete>().await?;
    io.recv::<backend::ReadyForQuery>().await?;

    io.add_stmt(sqlid, name.clone());

    Ok(PreparedStatement { sql: sql.into(), name })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unnamed_is_empty_string() {
        assert_eq!(StatementName::unnamed().as_str(), "");
        assert_eq!(PortalName::unnamed().as_str(), "");
    }

    #[test]
    fn prepared_statement_exposes_sql_and_name() {
        let stmt = PreparedStatement { sql: "select 1".into(), name: StatementName::next() };
        assert_eq!(stmt.sql(), "select 1");
        assert!(stmt.name().starts_with("qs_stmt_"));
    }

    #[test]
    fn next_names_are_distinct_and_prefixed() {
        let a = SavepointName::next();
        let b = SavepointName::next();
        assert_ne!(a.as_str(), b.as_str());
        assert!(a.as_str().starts_with("qs_sp_"));
        assert!(b.as_str().starts_with("qs_sp_"));
    }
}
