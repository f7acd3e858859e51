/// Capture pipeline state machine.
///
/// State transitions:
/// ```text
/// idle → capturing → idle
/// ```
///
/// A recorder is `Capturing` from the moment `start` returns until the
/// session's `stop` has joined the writer thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing)
    }
}
