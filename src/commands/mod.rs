pub mod config;
pub mod decr;
pub mod del;
pub mod echo;
pub mod executable;
pub mod exists;
pub mod get;
pub mod hello;
pub mod incr;
pub mod lpush;
pub mod ping;
pub mod rpush;
pub mod set;

use bytes::Bytes;
use std::str::FromStr;
use std::{str, vec};
use strum_macros::{AsRefStr, EnumString};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

use config::Config;
use decr::Decr;
use del::Del;
use echo::Echo;
use exists::Exists;
use get::Get;
use hello::Hello;
use incr::Incr;
use lpush::Lpush;
use ping::Ping;
use rpush::Rpush;
use set::Set;

#[derive(Debug, PartialEq)]
pub enum Command {
    Decr(Decr),
    Del(Del),
    Exists(Exists),
    Get(Get),
    Incr(Incr),
    Lpush(Lpush),
    Rpush(Rpush),
    Set(Set),

    Config(Config),
    Echo(Echo),
    Hello(Hello),
    Ping(Ping),
}

impl Executable for Command {
    fn exec(self, store: &Store) -> Result<Frame, Error> {
        match self {
            Command::Config(cmd) => cmd.exec(store),
            Command::Decr(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Echo(cmd) => cmd.exec(store),
            Command::Exists(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Hello(cmd) => cmd.exec(store),
            Command::Incr(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
        }
    }
}

/// Names of the supported commands, matched against the uppercased first element of a request.
#[derive(Debug, Clone, Copy, PartialEq, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
enum CommandName {
    Config,
    Decr,
    Del,
    Echo,
    Exists,
    Get,
    Hello,
    Incr,
    Lpush,
    Ping,
    Rpush,
    Set,
}

impl CommandName {
    /// Minimum number of elements in the request array, the command name included.
    fn min_frames(self) -> usize {
        match self {
            CommandName::Ping => 1,
            CommandName::Config
            | CommandName::Decr
            | CommandName::Del
            | CommandName::Echo
            | CommandName::Exists
            | CommandName::Get
            | CommandName::Hello
            | CommandName::Incr => 2,
            CommandName::Lpush | CommandName::Rpush | CommandName::Set => 3,
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as arrays of bulk strings.
        let frames = match frame {
            Frame::Array(array) => array,
            _ => return Err(CommandParserError::InvalidFormat.into()),
        };

        let command_name = match frames.first() {
            Some(Frame::Bulk(name)) => str::from_utf8(name)
                .map(|name| name.to_string())
                .map_err(CommandParserError::InvalidUTF8String)?,
            _ => return Err(CommandParserError::InvalidFormat.into()),
        };

        if !frames.iter().all(|frame| matches!(frame, Frame::Bulk(_))) {
            return Err(CommandParserError::InvalidFormat.into());
        }

        let name = CommandName::from_str(&command_name.to_uppercase()).map_err(|_| {
            CommandParserError::UnknownCommand {
                command: command_name.clone(),
            }
        });

        // Unknown commands have no arity, they are reported once the arity check passes.
        if let Ok(known) = name {
            if frames.len() < known.min_frames() {
                return Err(CommandParserError::WrongArity {
                    command: known.as_ref().to_lowercase(),
                }
                .into());
            }
        }

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };
        // Skip the command name, it was already inspected above.
        parser.parts.next();

        match name? {
            CommandName::Config => Config::try_from(parser).map(Command::Config),
            CommandName::Decr => Decr::try_from(parser).map(Command::Decr),
            CommandName::Del => Del::try_from(parser).map(Command::Del),
            CommandName::Echo => Echo::try_from(parser).map(Command::Echo),
            CommandName::Exists => Exists::try_from(parser).map(Command::Exists),
            CommandName::Get => Get::try_from(parser).map(Command::Get),
            CommandName::Hello => Hello::try_from(parser).map(Command::Hello),
            CommandName::Incr => Incr::try_from(parser).map(Command::Incr),
            CommandName::Lpush => Lpush::try_from(parser).map(Command::Lpush),
            CommandName::Ping => Ping::try_from(parser).map(Command::Ping),
            CommandName::Rpush => Rpush::try_from(parser).map(Command::Rpush),
            CommandName::Set => Set::try_from(parser).map(Command::Set),
        }
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    /// Number of arguments not consumed yet.
    fn remaining(&self) -> usize {
        self.parts.len()
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let bytes = self.next_bytes()?;

        str::from_utf8(&bytes[..])
            .map(|s| s.to_string())
            .map_err(CommandParserError::InvalidUTF8String)
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        let bytes = self.next_bytes()?;

        str::from_utf8(&bytes[..])
            .map_err(CommandParserError::InvalidUTF8String)?
            .parse::<i64>()
            .map_err(|_| CommandParserError::NotAnInteger)
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self
            .parts
            .next()
            .ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Bulk(bytes) => Ok(bytes),
            _ => Err(CommandParserError::InvalidFormat),
        }
    }

    /// Collects every remaining argument as a string, requiring at least one.
    fn remaining_strings(&mut self) -> Result<Vec<String>, CommandParserError> {
        let mut strings = vec![self.next_string()?];

        loop {
            match self.next_string() {
                Ok(string) => strings.push(string),
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(strings)
    }
}

/// Validation failures. The display text is exactly what is sent back to the client.
#[derive(Clone, Debug, ThisError, PartialEq)]
pub(crate) enum CommandParserError {
    #[error("invalid format for command")]
    InvalidFormat,
    #[error("wrong number of arguments for '{command}' command")]
    WrongArity { command: String },
    #[error("unsupported command {command}")]
    UnknownCommand { command: String },
    #[error("unsupported subcommand {subcommand} for {command}")]
    UnknownSubcommand { command: String, subcommand: String },
    #[error("syntax error")]
    Syntax,
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("invalid format for command")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}
