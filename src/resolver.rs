//! Forward-reference resolution.
//!
//! Content that cites an id before the id's value is known (a page-number citation
//! to an anchor further down the document) registers a callback here. The callback
//! runs exactly once: when the id is resolved, or at the end of the document with
//! `Resolution::Unresolved` so the consumer can keep its placeholder.
//!
//! The resolver is the only mutable state shared between page sequences that run in
//! parallel, so all access goes through a mutex. Callbacks always run with the lock
//! released and may register further references.

use folio_types::RefId;
use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Text that stands in for a reference nobody resolved.
pub const UNRESOLVED_PLACEHOLDER: &str = "??";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolverError {
    #[error("Reference resolver lock poisoned")]
    Poisoned,
}

/// What a pending consumer is told about its id.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<V> {
    Resolved(V),
    Unresolved,
}

impl<V> Resolution<V> {
    pub fn value(&self) -> Option<&V> {
        match self {
            Resolution::Resolved(value) => Some(value),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}

impl<V: fmt::Display> Resolution<V> {
    /// The resolved value as text, or the placeholder.
    pub fn display(&self) -> String {
        match self {
            Resolution::Resolved(value) => value.to_string(),
            Resolution::Unresolved => UNRESOLVED_PLACEHOLDER.to_string(),
        }
    }
}

pub type Consumer<V> = Box<dyn FnOnce(Resolution<V>) + Send>;

/// A reference that was cited but never resolved, reported by `finalize_unresolved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub id: RefId,
    /// How many consumers received `Resolution::Unresolved`.
    pub consumers: usize,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unresolved reference '{}' ({} citation(s) use '{}')",
            self.id, self.consumers, UNRESOLVED_PLACEHOLDER
        )
    }
}

struct PendingReference<V> {
    id: RefId,
    consumers: Vec<Consumer<V>>,
}

struct ResolverState<V> {
    resolved: HashMap<RefId, V>,
    /// In order of first registration.
    pending: Vec<PendingReference<V>>,
}

impl<V> Default for ResolverState<V> {
    fn default() -> Self {
        Self {
            resolved: HashMap::new(),
            pending: Vec::new(),
        }
    }
}

/// Publish/subscribe registry for values that become known after they are cited.
pub struct ReferenceResolver<V> {
    state: Mutex<ResolverState<V>>,
}

impl<V> Default for ReferenceResolver<V> {
    fn default() -> Self {
        Self {
            state: Mutex::new(ResolverState::default()),
        }
    }
}

impl<V> fmt::Debug for ReferenceResolver<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl<V: Clone + Send> ReferenceResolver<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, ResolverState<V>>, ResolverError> {
        self.state.lock().map_err(|_| ResolverError::Poisoned)
    }

    /// Registers `consumer` for `id`. Runs it immediately if `id` is already known.
    pub fn register_pending(
        &self,
        id: impl Into<RefId>,
        consumer: impl FnOnce(Resolution<V>) + Send + 'static,
    ) -> Result<(), ResolverError> {
        let id = id.into();
        let known = {
            let mut state = self.lock()?;
            let known = state.resolved.get(&id).cloned();
            if known.is_none() {
                match state.pending.iter_mut().find(|p| p.id == id) {
                    Some(pending) => pending.consumers.push(Box::new(consumer)),
                    None => state.pending.push(PendingReference {
                        id,
                        consumers: vec![Box::new(consumer)],
                    }),
                }
                return Ok(());
            }
            known
        };
        if let Some(value) = known {
            consumer(Resolution::Resolved(value));
        }
        Ok(())
    }

    /// Publishes the value of `id` and runs its pending consumers in registration order.
    ///
    /// Returns the number of consumers that ran. Ids resolve once; a second value for
    /// the same id is ignored.
    pub fn resolve(&self, id: impl Into<RefId>, value: V) -> Result<usize, ResolverError> {
        let id = id.into();
        let consumers = {
            let mut state = self.lock()?;
            if state.resolved.contains_key(&id) {
                warn!("Reference '{}' resolved more than once, keeping the first value", id);
                return Ok(0);
            }
            state.resolved.insert(id.clone(), value.clone());
            match state.pending.iter().position(|p| p.id == id) {
                Some(at) => state.pending.remove(at).consumers,
                None => Vec::new(),
            }
        };
        let count = consumers.len();
        if count > 0 {
            debug!("Reference '{}' resolved for {} pending consumer(s)", id, count);
        }
        for consumer in consumers {
            consumer(Resolution::Resolved(value.clone()));
        }
        Ok(count)
    }

    /// Ends the document: every still-pending consumer runs once with
    /// `Resolution::Unresolved`. Returns the unresolved ids in first-registration order.
    pub fn finalize_unresolved(&self) -> Result<Vec<UnresolvedReference>, ResolverError> {
        let pending = std::mem::take(&mut self.lock()?.pending);
        let mut unresolved = Vec::with_capacity(pending.len());
        for reference in pending {
            let report = UnresolvedReference {
                id: reference.id,
                consumers: reference.consumers.len(),
            };
            warn!("{}", report);
            for consumer in reference.consumers {
                consumer(Resolution::Unresolved);
            }
            unresolved.push(report);
        }
        Ok(unresolved)
    }

    /// Returns `false` if the lock is poisoned.
    pub fn is_resolved(&self, id: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.resolved.contains_key(&RefId::from(id)))
            .unwrap_or(false)
    }

    pub fn value(&self, id: &str) -> Option<V> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.resolved.get(&RefId::from(id)).cloned())
    }
}

impl<V> ReferenceResolver<V> {
    /// Number of ids with at least one waiting consumer. Returns 0 if the lock is poisoned.
    pub fn pending_count(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }
}
