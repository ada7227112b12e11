//! Ordering of generation-service responses.

/// Monotonically increasing tag attached to each generation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestGeneration(u64);

impl RequestGeneration {
    /// Creates a generation with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the generation.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Issues request generations and rejects responses older than the last applied.
///
/// Several requests may be in flight at once and may complete in any order;
/// a response is applied only if no newer response was applied before it.
#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    issued: u64,
    applied: Option<RequestGeneration>,
}

impl RequestTracker {
    /// Creates a tracker that has issued nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the generation for a new outgoing request.
    pub fn issue(&mut self) -> RequestGeneration {
        self.issued = self.issued.saturating_add(1);
        RequestGeneration(self.issued)
    }

    /// Reports whether a response with this generation may still be applied.
    #[must_use]
    pub fn accepts(&self, generation: RequestGeneration) -> bool {
        self.applied.map_or(true, |applied| generation > applied)
    }

    /// Records that the response with this generation was applied.
    pub fn mark_applied(&mut self, generation: RequestGeneration) {
        if self.accepts(generation) {
            self.applied = Some(generation);
        }
    }

    /// Most recently applied generation, if any.
    #[must_use]
    pub const fn latest_applied(&self) -> Option<RequestGeneration> {
        self.applied
    }
}
