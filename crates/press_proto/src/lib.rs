//! Wire protocol between the orchestrator and the executor: newline-delimited
//! JSON messages over one persistent duplex connection.
mod codec;
mod message;

pub use codec::{decode_command, decode_update, read_frame, write_frame, CodecError, Decoded};
pub use message::{Command, DeleteRequest, JobRequest, ObserverFrame, SnapshotData, Update};
