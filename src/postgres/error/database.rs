use bytes::{Buf, Bytes};

use crate::{ext::BytesExt, postgres::ProtocolError};

/// A structured error reported by the server via `ErrorResponse`.
///
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>
#[derive(Debug, Clone)]
pub struct DatabaseError {
    severity: String,
    code: String,
    message: String,
    detail: Option<String>,
    hint: Option<String>,
    position: Option<u32>,
    schema: Option<String>,
    table: Option<String>,
    column: Option<String>,
    constraint: Option<String>,
}

impl DatabaseError {
    pub(crate) fn parse(mut body: Bytes) -> Result<Self, ProtocolError> {
        let mut severity = None;
        let mut code = None;
        let mut message = None;
        let mut detail = None;
        let mut hint = None;
        let mut position = None;
        let mut schema = None;
        let mut table = None;
        let mut column = None;
        let mut constraint = None;

        loop {
            let field = body.get_u8();
            if field == 0 {
                break;
            }
            let value = body.get_nul_bytestr()?;
            match field {
                b'S' => severity = Some(value.to_string()),
                b'C' => code = Some(value.to_string()),
                b'M' => message = Some(value.to_string()),
                b'D' => detail = Some(value.to_string()),
                b'H' => hint = Some(value.to_string()),
                b'P' => position = value.parse().ok(),
                b's' => schema = Some(value.to_string()),
                b't' => table = Some(value.to_string()),
                b'c' => column = Some(value.to_string()),
                b'n' => constraint = Some(value.to_string()),
                // V (non-localized severity), R, W, F, L, q and others: not surfaced.
                _ => {}
            }
        }

        Ok(Self {
            severity: severity.unwrap_or_default(),
            code: code.unwrap_or_default(),
            message: message.unwrap_or_default(),
            detail,
            hint,
            position,
            schema,
            table,
            column,
            constraint,
        })
    }

    /// Field `S`: the severity, e.g. `ERROR`, `FATAL`, `PANIC`.
    pub fn severity(&self) -> &str {
        &self.severity
    }

    /// Field `C`: the five-character SQLSTATE code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Field `M`: the primary human-readable error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field `D`: an optional secondary message with more detail.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Field `H`: an optional suggestion on how to fix the problem.
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Field `P`: the 1-based character index into the original query string the error relates to.
    pub fn position(&self) -> Option<u32> {
        self.position
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }

    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.severity, self.message, self.code)
    }
}

impl std::error::Error for DatabaseError {}

#[cfg(test)]
mod test {
    use super::*;

    fn field(tag: u8, value: &str, buf: &mut Vec<u8>) {
        buf.push(tag);
        buf.extend_from_slice(value.as_bytes());
        buf.push(0);
    }

    #[test]
    fn parse_full_error_response() {
        let mut buf = Vec::new();
        field(b'S', "ERROR", &mut buf);
        field(b'C', "23505", &mut buf);
        field(b'M', "duplicate key value violates unique constraint", &mut buf);
        field(b'D', "Key (id)=(1) already exists.", &mut buf);
        field(b'P', "42", &mut buf);
        field(b't', "users", &mut buf);
        field(b'n', "users_pkey", &mut buf);
        buf.push(0);

        let err = DatabaseError::parse(Bytes::from(buf)).unwrap();
        assert_eq!(err.severity(), "ERROR");
        assert_eq!(err.code(), "23505");
        assert_eq!(err.table(), Some("users"));
        assert_eq!(err.constraint(), Some("users_pkey"));
        assert_eq!(err.position(), Some(42));
        assert_eq!(err.hint(), None);
        assert_eq!(
            err.to_string(),
            "ERROR: duplicate key value violates unique constraint (23505)"
        );
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut buf = Vec::new();
        field(b'V', "ERROR", &mut buf);
        field(b'S', "FATAL", &mut buf);
        field(b'M', "connection limit exceeded", &mut buf);
        buf.push(0);

        let err = DatabaseError::parse(Bytes::from(buf)).unwrap();
        assert_eq!(err.severity(), "FATAL");
        assert_eq!(err.message(), "connection limit exceeded");
    }

    #[test]
    fn missing_nul_terminator_is_a_protocol_error() {
        let buf = vec![b'S', b'E', b'R', b'R'];
        assert!(DatabaseError::parse(Bytes::from(buf)).is_err());
    }
}
