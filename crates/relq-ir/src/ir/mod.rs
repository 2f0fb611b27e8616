//! Intermediate representation of SELECT statements

pub(crate) mod correlation;
mod display;
pub mod expr;
mod rewrite;
pub mod select;
pub mod table;
pub mod visitor;
