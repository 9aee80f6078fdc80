use serde::Serialize;

use crate::foundation::ids::{ContextId, LinkageId};

/// Engine-wide handle of one linkage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LinkageKey {
    /// Owning context.
    pub context: ContextId,
    /// Linkage within the context.
    pub linkage: LinkageId,
}

/// Exclusive ownership of scroll consumption by one pinned linkage.
///
/// Claims do not nest: a second pinned linkage entering its region waits until the holder
/// leaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PinClaim {
    holder: Option<LinkageKey>,
}

impl PinClaim {
    /// Current holder.
    pub fn holder(&self) -> Option<LinkageKey> {
        self.holder
    }

    /// Take the claim if it is free or already held by `key`.
    pub fn try_acquire(&mut self, key: LinkageKey) -> bool {
        match self.holder {
            None => {
                tracing::trace!(?key, "pin claim acquired");
                self.holder = Some(key);
                true
            }
            Some(h) => h == key,
        }
    }

    /// Release the claim if `key` holds it.
    pub fn release(&mut self, key: LinkageKey) -> bool {
        if self.holder == Some(key) {
            tracing::trace!(?key, "pin claim released");
            self.holder = None;
            true
        } else {
            false
        }
    }

    /// Release the claim when `keep` rejects the current holder.
    pub fn release_unless(&mut self, keep: impl FnOnce(LinkageKey) -> bool) {
        if let Some(h) = self.holder
            && !keep(h)
        {
            self.release(h);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scroll/claim.rs"]
mod tests;
