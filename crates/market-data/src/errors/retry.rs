/// Whether a failed provider call is worth repeating.
///
/// Read by [`RetryingProvider`](crate::provider::RetryingProvider).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Repeating the call gives the same answer: unknown symbol, empty
    /// range, malformed data or a provider-side failure.
    Never,

    /// Rate limit or timeout. The same call may succeed after a delay.
    WithBackoff,
}
