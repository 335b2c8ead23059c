//! Command module - mutations and the queue that delivers them.
//!
//! - [`Mutation`] - typed edit to a status reply, with validated constructors
//! - [`CommandQueue`] - FIFO drained into the next status reply
//! - [`PendingCommand`] - caller-side handle resolved exactly once

mod mutation;
mod queue;

pub use mutation::{
    Mutation, GO_OUT_ON, HOT_WATER_TEMP_MAX, HOT_WATER_TEMP_MIN, ROOM_TEMP_MAX, ROOM_TEMP_MIN,
};
pub use queue::{CommandQueue, DrainOutcome, PendingCommand};
