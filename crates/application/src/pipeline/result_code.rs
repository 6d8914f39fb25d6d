/// Outcome of one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// Continue with the next stage, or finish normally after the last one.
    Success,
    /// Stop now and answer with the response already in the context.
    Finish,
    /// Stop now and answer SERVFAIL.
    Error,
}

impl ResultCode {
    pub fn is_success(self) -> bool {
        self == ResultCode::Success
    }
}
