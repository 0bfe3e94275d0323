#![crate_type = "lib"]
#![warn(missing_docs)]

//! Push streams whose operators take configuration that may itself be a
//! stream.
//!
//! An [`Operator`] pairs a transform with a [`Configuration`]; every entry of
//! the configuration is a [`Param`], either a fixed value or a [`Stream`] whose
//! latest value replaces it. The derived stream recomputes whenever the
//! upstream or any dynamic entry emits.

pub use config::{ConfigBinder, Configuration, Param, Resolver, Slot};
pub use error::StreamError;
pub use operator::Operator;
pub use operators::StreamExt;
pub use stream::{Broadcast, Listener, Producer, Sink, Stream, Subscription};

mod config;
mod error;
mod operator;
pub mod operators;
mod stream;
