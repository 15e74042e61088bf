use crate::{Result, postgres::backend};

/// A NUL byte terminates a query string on the wire, so one embedded in the SQL text would let
/// whatever follows it be silently dropped (or, worse, reinterpreted) by the server.
pub fn check_sql(sql: &str) -> Result<()> {
    match sql.as_bytes().contains(&0) {
        true => Err(crate::Error::Programming("query string contains a NUL byte".into())),
        false => Ok(()),
    }
}

/// Decode the row count from a [`CommandComplete`][1] message.
///
/// Only `SELECT n`, `INSERT oid n`, `UPDATE n` and `DELETE n` tags carry a row count; every
/// other tag (`BEGIN`, `COMMIT`, `CREATE TABLE`, `DO`, ...) reports `None`, not `0`.
///
/// [1]: backend::CommandComplete
pub fn command_complete(cmd: backend::CommandComplete) -> Option<u64> {
    let mut whs = cmd.tag.split_whitespace();
    let tag = whs.next()?;

    if tag == "INSERT" {
        // tag is "INSERT oid count"; oid is always 0 since PostgreSQL 8.0, skip it.
        return whs.nth(1).and_then(|e| e.parse().ok());
    }

    match tag {
        "SELECT" | "UPDATE" | "DELETE" => whs.next().and_then(|e| e.parse().ok()),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tagged(tag: &'static str) -> backend::CommandComplete {
        backend::CommandComplete { tag: tag.into() }
    }

    #[test]
    fn insert_skips_oid() {
        assert_eq!(command_complete(tagged("INSERT 0 3")), Some(3));
    }

    #[test]
    fn select_update_delete_report_row_count() {
        assert_eq!(command_complete(tagged("SELECT 10")), Some(10));
        assert_eq!(command_complete(tagged("UPDATE 5")), Some(5));
        assert_eq!(command_complete(tagged("DELETE 1")), Some(1));
    }

    #[test]
    fn non_rowcount_commands_report_none() {
        assert_eq!(command_complete(tagged("BEGIN")), None);
        assert_eq!(command_complete(tagged("COMMIT")), None);
        assert_eq!(command_complete(tagged("MERGE 0 2")), None);
        assert_eq!(command_complete(tagged("FETCH 2")), None);
        assert_eq!(command_complete(tagged("MOVE 2")), None);
        assert_eq!(command_complete(tagged("COPY 5")), None);
    }
}

