//! Statement compilation and execution.

pub mod compiler;
pub mod executor;
pub mod homophones;
pub mod statement;

pub use compiler::{RejectedWordsGuard, StatementBuilder};
pub use executor::{add_word, Cursor};
pub use statement::{SqlValue, Statement, StatementKind};
