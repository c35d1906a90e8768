//! Owner scope: the resolved identity whose rows an operation may touch.
//!
//! Scope resolution (who the caller is, whether they act on a personal or a
//! shared family ledger) happens outside the engine; the engine only threads
//! the resolved value through every store call. It is an explicit parameter,
//! never ambient state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerScope {
    /// A single user's personal ledger.
    User(Uuid),
    /// A shared ledger owned by a family group.
    Family(Uuid),
}

impl OwnerScope {
    /// The owning user or family id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        match self {
            Self::User(id) | Self::Family(id) => *id,
        }
    }
}
