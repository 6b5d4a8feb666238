//! What the client shows in place of the item list.
use crate::inventory::{Removal, SearchOutcome, SearchResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ItemView {
    #[default]
    List,
    /// `None` is an empty result, which still hides the list.
    SearchResult(Option<SearchResult>),
}

impl ItemView {
    pub fn apply_search(&mut self, outcome: &SearchOutcome) {
        *self = match outcome {
            SearchOutcome::Found(result) | SearchOutcome::Created(result) => {
                ItemView::SearchResult(Some(result.clone()))
            }
            SearchOutcome::Declined => ItemView::SearchResult(None),
        };
    }

    pub fn apply_add(&mut self, name: &str, quantity: u32) {
        if let Some(result) = self.held_mut(name) {
            result.quantity = quantity;
        }
    }

    pub fn apply_remove(&mut self, name: &str, removal: &Removal) {
        match removal {
            Removal::Absent => {}
            Removal::Deleted => {
                if self.held_mut(name).is_some() {
                    *self = ItemView::SearchResult(None);
                }
            }
            Removal::Decremented { quantity } => {
                if let Some(result) = self.held_mut(name) {
                    result.quantity = *quantity;
                }
            }
        }
    }

    pub fn discard(&mut self) {
        *self = ItemView::List;
    }

    pub fn held(&self) -> Option<&SearchResult> {
        match self {
            ItemView::SearchResult(Some(result)) => Some(result),
            _ => None,
        }
    }

    fn held_mut(&mut self, name: &str) -> Option<&mut SearchResult> {
        match self {
            ItemView::SearchResult(Some(result)) if result.name == name => Some(result),
            _ => None,
        }
    }
}
