/// Progress of an authenticated call through the retry-on-401 policy.
///
/// `Initial` may move to `RetriedOnce` exactly once; `RetriedOnce` is
/// terminal and its outcome is surfaced whatever it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Initial,
    RetriedOnce,
}

impl RetryState {
    /// Next state after an authorization failure, or `None` when no retry is left.
    pub fn on_unauthorized(self) -> Option<RetryState> {
        match self {
            RetryState::Initial => Some(RetryState::RetriedOnce),
            RetryState::RetriedOnce => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == RetryState::RetriedOnce
    }
}
