// Operator interrupt checks between units of cleanup work

/// Consulted by the orchestrator at safe points: before each page and before
/// reconciliation. Returning `true` stops the run with `Interrupted`.
pub trait InterruptGuard: Send + Sync {
  fn abort_requested(&self) -> bool;
}

/// Guard for non-interactive runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInterrupt;

impl InterruptGuard for NeverInterrupt {
  fn abort_requested(&self) -> bool {
    false
  }
}
