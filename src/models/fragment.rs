//! Fragment request models

/// Lifecycle of one fragment request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Settled,
}

/// What a settled request did to the page. The spinner is gone in every case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// HTTP 200 and the success handler ran
    Applied,
    /// Any status other than 200; the page was left as is
    Ignored { status: u16 },
    /// Transport failure or the success handler rejected the body
    Failed { reason: String },
}
