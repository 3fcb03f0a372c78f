//! Bot domain - inbound event routing and reply composition (glue).

pub mod events;
pub mod replies;
pub mod router;

pub use events::{CallbackAction, CallbackEvent, CommandEvent, InboundEvent};
pub use router::{CommandRouter, RouterConfig};
