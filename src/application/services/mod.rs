//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod document;
mod interaction;
mod session;

pub use document::{seed_nodes, DocumentService};
pub use interaction::{DragController, DragGesture, DragOutcome};
pub use session::Session;
