use vmflags_registry::keys::AllocatePrefetchDistance;
use vmflags_registry::{FlagError, Registry};

/// Prefetch distance used when the flag asks for the host's value.
pub const DEFAULT_PREFETCH_DISTANCE: isize = 192;

/// Resolves values that need the memory system, ahead of
/// `Phase::AfterMemoryInit` validation.
pub fn memory_init(registry: &mut Registry) -> Result<(), FlagError> {
	if registry.value(AllocatePrefetchDistance) == -1 {
		registry.set_ergo(AllocatePrefetchDistance, DEFAULT_PREFETCH_DISTANCE)?;
		tracing::debug!(
			domain = "ergo",
			distance = DEFAULT_PREFETCH_DISTANCE,
			"prefetch distance resolved"
		);
	}
	Ok(())
}
