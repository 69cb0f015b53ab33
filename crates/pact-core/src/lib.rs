//! Core pact coordination: offer negotiation, the kill/revive lifecycle, and
//! the deferred-task scheduler, all behind a single serially-driven facade.

pub mod coordinator;
pub mod host;
pub mod lifecycle;
pub mod messages;
pub mod negotiator;
pub mod scheduler;
pub mod sim;

pub use coordinator::{DeferredTask, PactCoordinator};
pub use host::Host;
pub use lifecycle::{LifecycleError, PactRegistry, ReviveOutcome};
pub use negotiator::{OfferBook, PendingOffer};
pub use scheduler::DeferredQueue;
pub use sim::SimWorld;
