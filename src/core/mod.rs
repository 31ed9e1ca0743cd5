//! Message and effect vocabulary for the serial shell loop.

pub mod effect;
pub mod msg;
