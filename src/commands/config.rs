use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Parameters reported by `CONFIG GET`, whatever the requested pattern. Clients such as
/// benchmarking tools query these on connect.
const PARAMETERS: [(&str, &str); 3] = [("maxmemory", "0"), ("save", ""), ("appendonly", "no")];

/// Only the `GET` subcommand is supported, and it always answers with the same parameters. The
/// requested patterns are not inspected.
///
/// Ref: <https://redis.io/docs/latest/commands/config-get/>
#[derive(Debug, PartialEq)]
pub struct Config;

impl Executable for Config {
    fn exec(self, _store: &Store) -> Result<Frame, Error> {
        let frames = PARAMETERS
            .iter()
            .flat_map(|(name, value)| [*name, *value])
            .map(|s| Frame::Bulk(Bytes::from_static(s.as_bytes())))
            .collect();

        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for Config {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let subcommand = parser.next_string()?;

        if !subcommand.eq_ignore_ascii_case("GET") {
            return Err(CommandParserError::UnknownSubcommand {
                command: "CONFIG".to_string(),
                subcommand,
            }
            .into());
        }

        Ok(Self)
    }
}
