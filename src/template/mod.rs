//! Notification template engine.
//!
//! A placement owns a set of templates. Generating a notification for a
//! placement runs these stages:
//! - template filters narrow the eligible template IDs ([`filter`])
//! - per-template conditions drop templates that do not apply ([`condition`])
//! - a weighted draw picks one survivor ([`selection`])
//! - `{variable}` placeholders are substituted ([`substitution`])
//!
//! When nothing survives, the caller's fallback strings are rendered instead.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(MemoryTemplateStore::new());
//! let assembler = NotificationAssembler::new(AppContext::new("my_app", store));
//!
//! let request = GenerateRequest::new("welcome_message")
//!     .with_variables(variables)
//!     .with_fallback("Welcome!", "Thanks for joining");
//!
//! let rendered = assembler.generate(&request).await?;
//! ```

mod assembler;
pub mod condition;
pub mod filter;
mod instrument;
pub mod selection;
pub mod substitution;
mod types;

pub use assembler::{AppContext, NotificationAssembler, NotificationGenerator, SAFE_FALLBACK_TITLE};
pub use condition::{evaluate_condition, filter_by_conditions};
pub use filter::resolve_template_filters;
pub use instrument::Instrumented;
pub use selection::{select_weighted, select_weighted_with};
pub use substitution::{apply_template, process_content, ProcessedContent};
pub use types::*;
