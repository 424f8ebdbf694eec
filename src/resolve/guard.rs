//! Cycle guard for one top-level resolution.
//!
//! Tracks the type identities currently being expanded plus the nesting
//! depth. A repeated identity or a nesting deeper than `max_depth` denies
//! entry, and the resolver degrades that branch to a `Reference`.
use std::collections::HashSet;

use crate::oracle::TypeId;

pub const DEFAULT_MAX_DEPTH: u32 = 50;

/// Why [`CycleGuard::try_enter`] refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denied {
    Cycle,
    DepthExceeded,
}

#[derive(Debug)]
pub struct CycleGuard {
    visiting: HashSet<TypeId>,
    depth: u32,
    max_depth: u32,
}

impl CycleGuard {
    pub fn new(max_depth: u32) -> Self {
        Self { visiting: HashSet::new(), depth: 0, max_depth }
    }

    /// Register `ty` as being expanded. `false` when it already is, or when
    /// the depth limit is reached; nothing is registered in that case.
    pub fn enter(&mut self, ty: TypeId) -> bool {
        self.try_enter(ty).is_ok()
    }

    pub fn try_enter(&mut self, ty: TypeId) -> Result<(), Denied> {
        if self.visiting.contains(&ty) {
            return Err(Denied::Cycle);
        }
        if self.depth >= self.max_depth {
            return Err(Denied::DepthExceeded);
        }
        self.visiting.insert(ty);
        self.depth += 1;
        Ok(())
    }

    /// Must follow every successful enter, exactly once.
    pub fn leave(&mut self, ty: TypeId) {
        let was_present = self.visiting.remove(&ty);
        debug_assert!(was_present, "CycleGuard::leave without matching enter for {ty:?}");
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn is_visiting(&self, ty: TypeId) -> bool {
        self.visiting.contains(&ty)
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl Default for CycleGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
