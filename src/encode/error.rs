use std::fmt;

/// An error when encoding a bound parameter.
pub enum EncodeError {
    /// The value does not fit in the target postgres type's range, e.g. binding `33000i64`
    /// into an `int2` column.
    Overflow {
        /// The postgres type name the value was being narrowed into, e.g. `"int2"`.
        ty: &'static str,
    },
}

impl std::error::Error for EncodeError {}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Overflow { ty } => write!(f, "value out of range for type {ty}"),
        }
    }
}

impl fmt::Debug for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
