use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Inserts all the specified values at the tail of the list stored at key.
///
/// Ref: <https://redis.io/docs/latest/commands/rpush/>
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Rpush {
    fn exec(self, store: &Store) -> Result<Frame, Error> {
        let pushed = store.lock().list_push(&self.key, self.values, false);
        Ok(Frame::Integer(pushed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let mut values = vec![];

        loop {
            match parser.next_bytes() {
                Ok(value) => values.push(value),
                Err(CommandParserError::EndOfStream) if !values.is_empty() => break,
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Self { key, values })
    }
}
