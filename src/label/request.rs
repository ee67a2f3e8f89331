use crate::animation::driver::Completion;

/// A blur or unblur request that arrived before the stages were ready.
pub struct DeferredRequest {
    /// Requested final state.
    pub blurred: bool,
    /// Animate instead of snapping.
    pub animated: bool,
    /// Fired once the request runs or is superseded.
    pub completion: Option<Completion>,
}

impl std::fmt::Debug for DeferredRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredRequest")
            .field("blurred", &self.blurred)
            .field("animated", &self.animated)
            .field("has_completion", &self.completion.is_some())
            .finish()
    }
}

impl DeferredRequest {
    /// A request without a completion.
    pub fn new(blurred: bool, animated: bool) -> Self {
        Self {
            blurred,
            animated,
            completion: None,
        }
    }

    /// Fire the completion, if any, with `finished`.
    pub fn finish(self, finished: bool) {
        if let Some(c) = self.completion {
            c(finished);
        }
    }
}

/// Single-slot queue for requests waiting on stage generation. The last writer wins.
#[derive(Debug, Default)]
pub struct RequestQueue {
    slot: Option<DeferredRequest>,
}

impl RequestQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `request`, returning the one it replaced.
    pub fn defer(&mut self, request: DeferredRequest) -> Option<DeferredRequest> {
        self.slot.replace(request)
    }

    /// Remove the pending request.
    pub fn take(&mut self) -> Option<DeferredRequest> {
        self.slot.take()
    }

    /// `true` while a request is waiting.
    pub fn is_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Blur requests only run against a ready stage set.
    pub fn can_run(&self, cache_ready: bool) -> bool {
        cache_ready
    }
}

#[cfg(test)]
#[path = "../../tests/unit/label/request.rs"]
mod tests;
