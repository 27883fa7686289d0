//! # patchrelay-render
//!
//! Tera-based template engine that renders commit messages, pull-request
//! titles and bodies, and the agent prompt for one patchrelay run.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use patchrelay_render::{MessageContext, Renderer};
//!
//! fn print_commit(ctx: &MessageContext) {
//!     if let Ok(renderer) = Renderer::new() {
//!         if let Ok(messages) = renderer.subrepo_messages(ctx) {
//!             println!("{}", messages.commit);
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::MessageContext;
pub use engine::{MessageKind, Renderer, SubrepoMessages, SuperprojectMessages, TemplateEngine};
pub use error::RenderError;
