/// Errors that can occur during asynchronous emission.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("failed to spawn emission thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{failed} emission thread(s) ended in a subscriber panic")]
    SubscriberPanicked { failed: usize },
}
