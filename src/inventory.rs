//! Card inventory: two attack sockets and a capped backpack.
//!
//! A card id appears at most once across both sockets and the backpack.
//! Picking up a duplicate raises the level of the copy already held.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::Socket;
use crate::mutations::{MutationCard, MutationKind, Tag};

pub const DEFAULT_BACKPACK_CAPACITY: usize = 6;

/// What `add_card` did with the card it was given.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOutcome {
    /// An existing copy went up to `level`.
    Stacked { level: u32 },
    /// Appended to the backpack as a new entry.
    Added,
    /// Backpack full and nothing to stack onto.
    Discarded,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    /// Oldest first; the last entry is the newest find.
    pub backpack: Vec<MutationCard>,
    pub socket_a: Option<MutationCard>,
    pub socket_b: Option<MutationCard>,
    pub capacity: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BACKPACK_CAPACITY)
    }
}

impl Inventory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            backpack: Vec::new(),
            socket_a: None,
            socket_b: None,
            capacity,
        }
    }

    /// Stack onto socket A, then socket B, then the backpack; otherwise
    /// append if there is room, else drop the card.
    pub fn add_card(&mut self, card: MutationCard) -> AddOutcome {
        let existing = self
            .socket_a
            .iter_mut()
            .chain(self.socket_b.iter_mut())
            .chain(self.backpack.iter_mut())
            .find(|held| held.kind == card.kind);

        if let Some(held) = existing {
            held.level += 1;
            return AddOutcome::Stacked { level: held.level };
        }

        if self.backpack.len() < self.capacity {
            self.backpack.push(card);
            AddOutcome::Added
        } else {
            debug!(card = card.id(), "backpack full, card discarded");
            AddOutcome::Discarded
        }
    }

    pub fn socket(&self, socket: Socket) -> Option<&MutationCard> {
        match socket {
            Socket::A => self.socket_a.as_ref(),
            Socket::B => self.socket_b.as_ref(),
        }
    }

    fn socket_mut(&mut self, socket: Socket) -> &mut Option<MutationCard> {
        match socket {
            Socket::A => &mut self.socket_a,
            Socket::B => &mut self.socket_b,
        }
    }

    /// Equipped cards in equip order (A, then B).
    pub fn equipped(&self) -> impl Iterator<Item = &MutationCard> {
        self.socket_a.iter().chain(self.socket_b.iter())
    }

    /// Every held card: sockets first, then the backpack.
    pub fn owned(&self) -> impl Iterator<Item = &MutationCard> {
        self.equipped().chain(self.backpack.iter())
    }

    pub fn owns(&self, kind: MutationKind) -> bool {
        self.owned().any(|card| card.kind == kind)
    }

    pub fn find(&self, kind: MutationKind) -> Option<&MutationCard> {
        self.owned().find(|card| card.kind == kind)
    }

    pub fn equipped_has_tag(&self, tag: Tag) -> bool {
        self.equipped().any(|card| card.has_tag(tag))
    }

    /// Move the newest backpack card into `socket`.  Whatever the socket
    /// held goes back to the end of the backpack with its level intact.
    /// Returns the kind that was equipped, if the backpack had anything.
    pub fn equip_newest(&mut self, socket: Socket) -> Option<MutationKind> {
        let newest = self.backpack.pop()?;
        let displaced = self.socket_mut(socket).replace(newest);
        if let Some(old) = displaced {
            self.backpack.push(old);
        }
        debug!(?socket, card = newest.id(), "equipped");
        Some(newest.kind)
    }
}
