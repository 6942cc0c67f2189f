// ABOUTME: Close confirmation gate for tabs with unsaved changes
// ABOUTME: Holds at most one pending close request until confirmed or cancelled

use devvault_types::TabId;

/// `Idle` when nothing is pending, `AwaitingConfirmation` otherwise
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CloseConfirmationGate {
    pending: Option<TabId>,
}

impl CloseConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&TabId> {
        self.pending.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Start waiting for a decision about `tab_id`.
    ///
    /// Requesting the tab that is already pending is accepted again. A request
    /// for any other tab while one is pending fails with the pending id.
    pub fn request(&mut self, tab_id: TabId) -> Result<(), TabId> {
        match &self.pending {
            Some(pending) if *pending != tab_id => Err(pending.clone()),
            _ => {
                self.pending = Some(tab_id);
                Ok(())
            }
        }
    }

    /// Leave the waiting state, handing back the tab that was pending
    pub fn take(&mut self) -> Option<TabId> {
        self.pending.take()
    }

    /// Forget the request if it is about `tab_id`
    pub fn discard(&mut self, tab_id: &TabId) -> bool {
        if self.pending.as_ref() == Some(tab_id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pending_request() {
        let mut gate = CloseConfirmationGate::new();
        assert!(gate.is_idle());

        gate.request(TabId::new("item-1")).unwrap();
        assert_eq!(gate.pending().map(TabId::as_str), Some("item-1"));
        assert!(gate.request(TabId::new("item-1")).is_ok());
        assert_eq!(
            gate.request(TabId::new("item-2")),
            Err(TabId::new("item-1"))
        );

        assert_eq!(gate.take(), Some(TabId::new("item-1")));
        assert!(gate.is_idle());
        assert_eq!(gate.take(), None);
    }

    #[test]
    fn test_discard_only_matching_tab() {
        let mut gate = CloseConfirmationGate::new();
        gate.request(TabId::new("item-1")).unwrap();

        assert!(!gate.discard(&TabId::new("item-2")));
        assert!(!gate.is_idle());
        assert!(gate.discard(&TabId::new("item-1")));
        assert!(gate.is_idle());
    }
}
