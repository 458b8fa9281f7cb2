//! Action registry for the Senora gateway.
//!
//! An action is a directory holding a `modal.json` Slack view. The registry
//! is loaded once at start-up; actions that fail to load are skipped with a
//! warning so one broken definition never hides the rest.

pub mod error;
pub mod loader;
pub mod registry;
pub mod template;

pub use error::{ActionError, ActionResult};
pub use registry::ActionRegistry;
pub use template::FormTemplate;
