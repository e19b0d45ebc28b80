use tracing::{debug, warn};

use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::frame::Frame;
use crate::store::Store;

/// Turns raw request bytes into raw response bytes, executing every command against the store.
#[derive(Clone)]
pub struct Handler {
    store: Store,
}

impl Handler {
    pub fn new(store: Store) -> Handler {
        Handler { store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Executes every request pipelined in `input` and returns the concatenated responses, in
    /// request order.
    ///
    /// Requests are decoded back to back until the input is exhausted. Malformed bytes end the
    /// pipeline: a single error is answered for them and whatever follows is dropped, since
    /// there is no way to know where the next request would start.
    pub fn serve_input(&self, input: &[u8]) -> Vec<u8> {
        let mut response = Vec::new();
        let mut offset = 0;

        while offset < input.len() {
            match Frame::decode(input, offset) {
                Ok((consumed, frame)) => {
                    offset += consumed;
                    response.extend(self.handle_frame(frame).serialize());
                }
                Err(err) => {
                    warn!(offset, "Dropping malformed input: {}", err);
                    response.extend(Frame::Error(err.to_string()).serialize());
                    break;
                }
            }
        }

        response
    }

    /// Validates and executes a single decoded request. Failures are answered as error frames.
    pub fn handle_frame(&self, frame: Frame) -> Frame {
        debug!("Received frame: {}", frame);

        let res = Command::try_from(frame).and_then(|cmd| cmd.exec(&self.store));

        match res {
            Ok(frame) => frame,
            Err(err) => {
                debug!("Command failed: {}", err);
                Frame::Error(err.to_string())
            }
        }
    }
}
