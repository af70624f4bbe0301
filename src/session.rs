//! Last-writer-wins sequencing for overlapping renders.
//!
//! Rapid edits issue renders faster than the service answers them. Each
//! render gets a [`Ticket`]; when it completes, its result is only used if no
//! newer render was started in the meantime. Superseded requests are not
//! cancelled, their results are simply dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::client::RenderClient;
use crate::graphic::RenderResult;
use crate::source::normalize;

/// Sequence number of one render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Orders renders by submission and recognises stale results.
#[derive(Debug, Default)]
pub struct RenderSession {
    client: RenderClient,
    latest: AtomicU64,
}

impl RenderSession {
    pub const fn new(client: RenderClient) -> Self {
        Self {
            client,
            latest: AtomicU64::new(0),
        }
    }

    pub const fn client(&self) -> &RenderClient {
        &self.client
    }

    /// Issue a ticket newer than every ticket issued before it.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// True if no ticket was issued after `ticket`.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::Acquire) == ticket.0
    }

    /// Render `raw`, returning `None` if a newer render began while this one
    /// was in flight.
    pub async fn render_latest(&self, raw: &str) -> Option<RenderResult> {
        let ticket = self.begin();
        let result = self.client.render(&normalize(raw)).await;
        if self.is_current(ticket) {
            Some(result)
        } else {
            debug!(
                sequence = ticket.sequence(),
                latest = self.latest.load(Ordering::Acquire),
                "dropping stale render result"
            );
            None
        }
    }
}
