//! Collaborators the tree engine consumes but does not own: id generation
//! and wall-clock time. Both are injected through a [`TreeContext`] so that
//! several conversations can live in one process and tests stay
//! deterministic.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::conversation::{NodeId, Role};

/// Collision-free id source.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self, role: Role) -> NodeId;
}

impl<F> IdGenerator for F
where
    F: Fn(Role) -> NodeId + Send + Sync,
{
    fn next_id(&self, role: Role) -> NodeId {
        self(role)
    }
}

/// Wall-clock source, in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// `<role>_<uuid v7>` ids; time-ordered, so sorting ids sorts by creation.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self, role: Role) -> NodeId {
        NodeId::new(format!("{}_{}", role, Uuid::now_v7()))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct TreeContext {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl TreeContext {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// UUID v7 ids and the system clock.
    pub fn system() -> Self {
        Self::new(Arc::new(UuidIdGenerator), Arc::new(SystemClock))
    }

    pub fn next_id(&self, role: Role) -> NodeId {
        self.ids.next_id(role)
    }

    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

impl Default for TreeContext {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for TreeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_carry_role_prefix_and_do_not_repeat() {
        let ids = UuidIdGenerator;
        let a = ids.next_id(Role::User);
        let b = ids.next_id(Role::User);
        assert!(a.as_str().starts_with("user_"));
        assert_ne!(a, b);
        assert!(ids.next_id(Role::Assistant).as_str().starts_with("assistant_"));
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
