//! Designer facade
//!
//! Ties validation and locking together for the edit operations a visual
//! data-modelling client performs. All state lives in the caller's
//! `ProjectSnapshot`; the designer mutates it only after a change has been
//! validated and the caller holds the lock the change needs.
//!
//! | Operation             | Lock needed  |
//! |-----------------------|--------------|
//! | `add_field`           | optimistic   |
//! | relationship changes  | optimistic on the source table |
//! | `remove_field`        | pessimistic  |
//! | `rename_table`        | pessimistic  |
//! | `transition_status`   | pessimistic  |

mod engine;
mod errors;

pub use engine::{Edit, SchemaDesigner};
pub use errors::{DesignError, DesignResult};
