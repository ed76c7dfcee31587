//! Per-mutation failure policies.

/// What a store does with a mutation when the remote call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationPolicy {
    /// Apply the change to local state anyway and record the error.
    OptimisticLocal,
    /// Record the error and leave local state untouched.
    PessimisticRemoteOnly,
}

impl MutationPolicy {
    /// Whether a failed remote call still mutates local state.
    #[must_use]
    pub const fn applies_locally_on_failure(self) -> bool {
        matches!(self, Self::OptimisticLocal)
    }
}

/// Failure policy for each mutation kind of one entity store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncPolicy {
    pub create: MutationPolicy,
    pub update: MutationPolicy,
    pub remove: MutationPolicy,
}

impl SyncPolicy {
    /// Every mutation applies locally on failure (cart, testimonials, blog).
    pub const LOCAL_FIRST: Self = Self {
        create: MutationPolicy::OptimisticLocal,
        update: MutationPolicy::OptimisticLocal,
        remove: MutationPolicy::OptimisticLocal,
    };

    /// Creates and deletes apply locally on failure, updates wait for the
    /// backend (products, orders, users).
    pub const CONFIRMED_UPDATES: Self = Self {
        create: MutationPolicy::OptimisticLocal,
        update: MutationPolicy::PessimisticRemoteOnly,
        remove: MutationPolicy::OptimisticLocal,
    };
}
