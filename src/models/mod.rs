pub mod payload;
pub mod status;

pub use payload::{Payload, PayloadKind};
pub use status::DispatchResult;
