//! The dispatch pipeline.
//!
//! [`Dispatcher`] turns one `(caller, request)` pair into a response or
//! exactly one error. Construction goes through [`DispatcherBuilder`].

mod builder;
mod dispatcher;

pub use builder::DispatcherBuilder;
pub use dispatcher::{DEFAULT_REQUEST_TIMEOUT, Dispatcher};
