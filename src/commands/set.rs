use bytes::Bytes;
use std::str::FromStr;
use strum_macros::EnumString;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{now_millis, Store};
use crate::Error;

/// Set `key` to hold the string `value`. If `key` already holds a value, it is overwritten, and
/// any previous time to live is discarded.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
    pub ttl: Option<Ttl>,
}

#[derive(Debug, PartialEq)]
pub enum Ttl {
    /// Seconds from now.
    Ex(i64),
    /// Milliseconds from now.
    Px(i64),
    /// Unix time in seconds.
    ExAt(i64),
    /// Unix time in milliseconds.
    PxAt(i64),
}

#[derive(Debug, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
enum TtlOption {
    Ex,
    Px,
    ExAt,
    PxAt,
}

impl Ttl {
    /// Resolves the option into an absolute unix timestamp in milliseconds.
    pub fn deadline(&self, now: i64) -> i64 {
        match self {
            Ttl::Ex(seconds) => now.saturating_add(seconds.saturating_mul(1000)),
            Ttl::Px(millis) => now.saturating_add(*millis),
            Ttl::ExAt(seconds) => seconds.saturating_mul(1000),
            Ttl::PxAt(millis) => *millis,
        }
    }
}

impl Executable for Set {
    fn exec(self, store: &Store) -> Result<Frame, Error> {
        let expires_at = self.ttl.map(|ttl| ttl.deadline(now_millis()));

        store.lock().set(self.key, self.value, expires_at);

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;

        // Either no options at all, or exactly one expiration option with its argument.
        let ttl = match parser.remaining() {
            0 => None,
            2 => {
                let option = TtlOption::from_str(&parser.next_string()?)
                    .map_err(|_| CommandParserError::Syntax)?;
                let value = parser.next_integer()?;

                Some(match option {
                    TtlOption::Ex => Ttl::Ex(value),
                    TtlOption::Px => Ttl::Px(value),
                    TtlOption::ExAt => Ttl::ExAt(value),
                    TtlOption::PxAt => Ttl::PxAt(value),
                })
            }
            _ => {
                return Err(CommandParserError::WrongArity {
                    command: "set".to_string(),
                }
                .into())
            }
        };

        Ok(Self { key, value, ttl })
    }
}
