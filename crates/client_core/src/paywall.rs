use serde::{Deserialize, Serialize};
use shared::protocol::NoteDetail;

pub const DEFAULT_FREE_PREVIEW_PAGES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaywallPolicy {
    pub free_preview_pages: u32,
}

impl Default for PaywallPolicy {
    fn default() -> Self {
        Self {
            free_preview_pages: DEFAULT_FREE_PREVIEW_PAGES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAccess {
    Visible,
    Locked,
    OutOfRange,
}

/// Decides which pages of a note the viewer may render. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaywallGate {
    policy: PaywallPolicy,
    page_count: u32,
    purchased: bool,
}

impl PaywallGate {
    pub fn new(policy: PaywallPolicy, page_count: u32, purchased: bool) -> Self {
        Self {
            policy,
            page_count,
            purchased,
        }
    }

    /// Free notes (price 0) are always fully visible.
    pub fn for_note(policy: PaywallPolicy, note: &NoteDetail) -> Self {
        let unlocked = note.purchased || note.summary.price_paise == 0;
        Self::new(policy, note.page_count, unlocked)
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn visible_pages(&self) -> u32 {
        if self.purchased {
            self.page_count
        } else {
            self.page_count.min(self.policy.free_preview_pages)
        }
    }

    pub fn locked_pages(&self) -> u32 {
        self.page_count - self.visible_pages()
    }

    pub fn page_access(&self, page: u32) -> PageAccess {
        if page == 0 || page > self.page_count {
            PageAccess::OutOfRange
        } else if page <= self.visible_pages() {
            PageAccess::Visible
        } else {
            PageAccess::Locked
        }
    }

    pub fn is_fully_unlocked(&self) -> bool {
        self.locked_pages() == 0
    }

    /// Call once the purchase of the note is confirmed.
    pub fn unlock(&mut self) {
        self.purchased = true;
    }
}

#[cfg(test)]
#[path = "tests/paywall_tests.rs"]
mod tests;
