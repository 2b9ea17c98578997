//! Blind generation of equation strings. Nothing produced here is known to
//! parse; the validator sorts that out afterwards.

pub mod generator;
pub mod grammar;

pub use generator::EquationGen;
pub use grammar::{Grammar, Token, TokenClass};
