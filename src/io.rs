mod poll;
mod read_buf;
mod write_all;

pub use poll::{poll_read, poll_write_all};
pub use read_buf::ReadBuf;
pub use write_all::WriteAllBuf;
