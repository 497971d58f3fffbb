//! Two-phase delete confirmation.
//!
//! `Idle --request(id)--> Pending(id) --confirm--> Idle (+ delete)`
//! `Pending(id) --cancel--> Idle`
//!
//! A new request while pending replaces the pending id.

/// Delete confirmation state for one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteConfirmation<Id> {
    #[default]
    Idle,
    Pending(Id),
}

impl<Id: Copy> DeleteConfirmation<Id> {
    /// Marks `id` for deletion.
    pub fn request(&mut self, id: Id) {
        *self = Self::Pending(id);
    }

    /// Returns to idle, yielding the id that was pending.
    pub fn cancel(&mut self) -> Option<Id> {
        self.reset()
    }

    /// Consumes the pending id for the caller to delete.
    pub fn confirm(&mut self) -> Option<Id> {
        self.reset()
    }

    pub fn pending(&self) -> Option<Id> {
        match self {
            Self::Idle => None,
            Self::Pending(id) => Some(*id),
        }
    }

    fn reset(&mut self) -> Option<Id> {
        match std::mem::replace(self, Self::Idle) {
            Self::Idle => None,
            Self::Pending(id) => Some(id),
        }
    }
}
