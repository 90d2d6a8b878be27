//! Classic `field:value` query syntax
//!
//! This module provides:
//! - A lexer and a generic recursive-descent parser driving [`QueryHooks`]
//! - [`FieldDispatchParser`], the hooks that compile fields against the
//!   reserved-field table and the content model
//! - Two-stage escaping of literal values

pub mod dispatch;
pub mod escape;
pub mod lexer;
pub mod parser;
pub mod reserved;

pub use dispatch::{DispatchContext, FieldDispatchParser, PhraseSlot, SlotTicket};
pub use parser::{DefaultOperator, QueryHooks, QueryStringParser};
pub use reserved::{is_reserved, ReservedField};
