use std::collections::HashMap;
use std::fmt;

use sluice_core::{Flow, Pull, Result, Value};

use crate::confluence::{Confluence, HandleId};

/// Single-slot relay feeding a bypass sub-chain.
///
/// Yields the pending value once, then reports [`Pull::Dry`] until filled
/// again. Inside a fan-out pipe each stream handle gets its own slot.
#[derive(Default)]
pub struct Drip {
    pending: HashMap<Option<HandleId>, Value>,
    streams: Option<Confluence>,
}

impl Drip {
    pub fn new() -> Self {
        Self::default()
    }

    /// A drip keeping one slot per stream of `confluence`.
    pub fn per_stream(confluence: Confluence) -> Self {
        Self {
            pending: HashMap::new(),
            streams: Some(confluence),
        }
    }

    fn slot(&self) -> Option<HandleId> {
        self.streams.as_ref().and_then(Confluence::current)
    }

    pub fn fill(&mut self, value: Value) {
        if let Some(confluence) = &self.streams {
            self.pending
                .retain(|id, _| id.map_or(true, |id| confluence.is_open(id)));
        }
        let slot = self.slot();
        self.pending.insert(slot, value);
    }

    pub fn try_take(&mut self) -> Option<Value> {
        let slot = self.slot();
        self.pending.remove(&slot)
    }

    pub fn clear(&mut self) {
        let slot = self.slot();
        self.pending.remove(&slot);
    }

    pub fn is_empty(&self) -> bool {
        !self.pending.contains_key(&self.slot())
    }
}

impl fmt::Debug for Drip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drip")
            .field("pending", &self.pending.get(&self.slot()))
            .field("per_stream", &self.streams.is_some())
            .finish()
    }
}

impl Flow for Drip {
    fn pull(&mut self) -> Result<Pull> {
        Ok(match self.try_take() {
            Some(v) => Pull::Item(v),
            None => Pull::Dry,
        })
    }
}
