//! Pipeline stages for document-to-Markdown conversion.
//!
//! Each submodule implements exactly one step. The engine hops themselves
//! live in [`crate::engine`]; everything here is local text or file work.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine (→ HTML) ──▶ preprocess ──▶ engine (→ Markdown)
//!                    │
//!                    └──▶ validate (advisory)
//! ```
//!
//! 1. [`input`]      — check the user-supplied path, read HTML as text,
//!    derive output names
//! 2. [`preprocess`] — ordered regex rules repairing table markup
//! 3. [`validate`]   — count tables and flag risky constructs without
//!    modifying anything

pub mod input;
pub mod preprocess;
pub mod validate;
