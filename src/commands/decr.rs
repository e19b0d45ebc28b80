use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Decrements the number stored at key by one. A missing key is set to 0 before performing the
/// operation.
///
/// Ref: <https://redis.io/docs/latest/commands/decr/>
#[derive(Debug, PartialEq)]
pub struct Decr {
    pub key: String,
}

impl Executable for Decr {
    fn exec(self, store: &Store) -> Result<Frame, Error> {
        let res = store.lock().atomic_delta(&self.key, -1);

        match res {
            Ok(value) => Ok(Frame::Integer(value)),
            Err(err) => Ok(Frame::Error(err.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Decr {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use bytes::Bytes;

    fn decr_frame() -> Frame {
        Frame::Array(vec![
            Frame::Bulk(Bytes::from("DECR")),
            Frame::Bulk(Bytes::from("key1")),
        ])
    }

    #[test]
    fn existing_key() {
        let cmd = Command::try_from(decr_frame()).unwrap();

        assert_eq!(
            cmd,
            Command::Decr(Decr {
                key: "key1".to_string()
            })
        );

        let store = Store::new();
        store
            .lock()
            .set(String::from("key1"), Bytes::from("1"), None);

        let result = cmd.exec(&store).unwrap();

        assert_eq!(result, Frame::Integer(0));
        assert_eq!(store.lock().get("key1"), Some(Bytes::from("0")));
    }

    #[test]
    fn non_existing_key() {
        let cmd = Command::try_from(decr_frame()).unwrap();
        let store = Store::new();

        let result = cmd.exec(&store).unwrap();

        assert_eq!(result, Frame::Integer(-1));
    }

    #[test]
    fn out_of_range() {
        let cmd = Command::try_from(decr_frame()).unwrap();
        let store = Store::new();
        store
            .lock()
            .set(String::from("key1"), i64::MIN.to_string().into(), None);

        let result = cmd.exec(&store).unwrap();

        assert_eq!(
            result,
            Frame::Error("value is not an integer or out of range".to_string())
        );
    }

    #[test]
    fn missing_key_argument() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from("DECR"))]);
        let err = Command::try_from(frame).err().unwrap();

        assert_eq!(
            err.to_string(),
            "wrong number of arguments for 'decr' command"
        );
    }
}
