//! Client for the YDNS dynamic DNS update API.
//!
//! [`UpdateRequest::build`] turns settings into the update URL,
//! [`Updater`] sends it and classifies the reply, and [`schedule::run`]
//! repeats that on a fixed interval in daemon mode.

pub mod config;
pub mod error;
pub mod family;
pub mod request;
pub mod schedule;
pub mod updater;

pub use error::UpdateError;
pub use family::Family;
pub use request::{Credentials, UpdateRequest, UpdateTarget};
pub use schedule::{Schedule, Sleeper, TokioSleeper};
pub use updater::Updater;
