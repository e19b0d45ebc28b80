use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Inserts all the specified values at the head of the list stored at key. Elements are inserted
/// one after the other, so `LPUSH mylist a b c` leaves `c` first.
///
/// Ref: <https://redis.io/docs/latest/commands/lpush/>
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    fn exec(self, store: &Store) -> Result<Frame, Error> {
        let pushed = store.lock().list_push(&self.key, self.values, true);
        Ok(Frame::Integer(pushed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn multiple_values() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPUSH")),
            Frame::Bulk(Bytes::from("list1")),
            Frame::Bulk(Bytes::from("k1")),
            Frame::Bulk(Bytes::from("k2")),
            Frame::Bulk(Bytes::from("k3")),
        ]);
        let cmd = Command::try_from(frame).unwrap();

        assert_eq!(
            cmd,
            Command::Lpush(Lpush {
                key: "list1".to_string(),
                values: vec![Bytes::from("k1"), Bytes::from("k2"), Bytes::from("k3")],
            })
        );

        let store = Store::new();

        assert_eq!(cmd.exec(&store).unwrap(), Frame::Integer(3));
        assert_eq!(store.lock().get("list1"), Some(Bytes::from("k3\tk2\tk1")));
    }

    #[test]
    fn missing_values() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPUSH")),
            Frame::Bulk(Bytes::from("list1")),
        ]);
        let err = Command::try_from(frame).err().unwrap();

        assert_eq!(
            err.to_string(),
            "wrong number of arguments for 'lpush' command"
        );
    }

    #[test]
    fn invalid_frame() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("LPUSH")),
            Frame::Simple(String::from("list1")),
            Frame::Bulk(Bytes::from("k1")),
        ]);
        let err = Command::try_from(frame).err().unwrap();

        assert_eq!(err.to_string(), "invalid format for command");
    }
}
