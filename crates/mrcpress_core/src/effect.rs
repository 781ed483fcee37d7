#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Ask the engine to stop once the in-flight cycle has finished.
    StopEngine,
}
