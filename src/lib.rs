//! LinePoster - hand off text and images to the LINE app
//!
//! The [`Dispatcher`] checks whether the app is installed, builds a deep link
//! or web share URL, and asks the platform to open it. Bundled assets are
//! staged into a writable directory first so they can be shared by path.

pub mod dispatcher;
pub mod encoding;
pub mod logging;
pub mod models;
pub mod platform;
pub mod storage;

pub use dispatcher::{Dispatcher, PosterConfig, Route, ShareUri};
pub use models::{DispatchResult, Payload, PayloadKind};
