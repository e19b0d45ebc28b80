use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Only RESP2 is spoken.
const SUPPORTED_PROTOCOL: i64 = 2;

/// Switches to a different protocol version. Since only RESP2 is supported, this is a handshake
/// that succeeds for version 2 and fails for anything else.
///
/// Ref: <https://redis.io/docs/latest/commands/hello/>
#[derive(Debug, PartialEq)]
pub struct Hello {
    pub protocol: i64,
}

impl Executable for Hello {
    fn exec(self, _store: &Store) -> Result<Frame, Error> {
        if self.protocol != SUPPORTED_PROTOCOL {
            return Ok(Frame::Error(
                "NOPROTO sorry, this protocol version is not supported".to_string(),
            ));
        }

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Hello {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let protocol = parser
            .next_integer()
            .map_err(|_| CommandParserError::InvalidFormat)?;

        Ok(Self { protocol })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::commands::Command;

    fn hello(version: &'static str) -> Result<Frame, Error> {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("HELLO")),
            Frame::Bulk(Bytes::from(version)),
        ]);

        Command::try_from(frame)?.exec(&Store::new())
    }

    #[test]
    fn supported_version() {
        assert_eq!(hello("2").unwrap(), Frame::Simple("OK".to_string()));
    }

    #[test]
    fn unsupported_version() {
        assert_eq!(
            hello("3").unwrap(),
            Frame::Error("NOPROTO sorry, this protocol version is not supported".to_string())
        );
    }

    #[test]
    fn invalid_version() {
        let err = hello("two").err().unwrap();

        assert_eq!(err.to_string(), "invalid format for command");
    }
}
