//! Client-side resource stores and shared request-lifecycle bookkeeping.
//!
//! Each store pairs an in-memory collection with a [`RequestState`]: an
//! operation flips `loading` on and clears `error` when it starts, then
//! settles with `loading` off and `error` either populated or cleared,
//! mutually exclusively. Overlapping calls are disambiguated by ticket: a
//! response is applied only when it belongs to the most recently issued
//! request for that slot, so a stale response that lands late can never
//! overwrite newer state.

pub mod files;
pub mod shares;

pub use files::FileStore;
pub use shares::ShareStore;

/// Proof that a request was issued against a [`RequestState`]; carries the
/// generation it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Loading/error slot for one logical operation family.
#[derive(Debug, Default)]
pub struct RequestState {
    loading: bool,
    error: Option<String>,
    issued: u64,
}

impl RequestState {
    /// Marks a request in flight and returns its ticket.
    pub fn begin(&mut self) -> RequestTicket {
        self.issued += 1;
        self.loading = true;
        self.error = None;
        RequestTicket(self.issued)
    }

    /// Whether the ticket belongs to the most recently issued request.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Settles the slot for the given ticket. Returns false (leaving all
    /// state untouched) when a newer request has been issued since.
    pub fn finish(&mut self, ticket: RequestTicket, outcome: Result<(), String>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.loading = false;
        self.error = outcome.err();
        true
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
