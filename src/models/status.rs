/// Terminal outcome of a post operation
///
/// Every failure inside the dispatcher is converted into one of these tags
/// at its origin. Host code maps them to user-facing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchResult {
    /// The platform accepted the handoff request
    Succeeded,
    /// The target app is missing (and fallback is off) or no handler resolved the URI
    AppNotInstalled,
    /// The payload could not be re-encoded for the URI
    EncodingFailed,
    /// The bundled asset could not be copied into local storage
    AssetCopyFailed,
}

impl DispatchResult {
    /// Stable integer status code for hosts that pass results across an FFI or process boundary
    pub fn code(&self) -> i32 {
        match self {
            DispatchResult::Succeeded => 1,
            DispatchResult::AppNotInstalled => -1,
            DispatchResult::AssetCopyFailed => -2,
            DispatchResult::EncodingFailed => -3,
        }
    }

    /// Inverse of [`DispatchResult::code`]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(DispatchResult::Succeeded),
            -1 => Some(DispatchResult::AppNotInstalled),
            -2 => Some(DispatchResult::AssetCopyFailed),
            -3 => Some(DispatchResult::EncodingFailed),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Succeeded)
    }
}
