pub mod config;
pub mod dedup;
pub mod expr;
pub mod pipeline;
pub mod search;
pub mod sql;
pub mod synth;
pub mod tokenize;
pub mod validate;
pub mod value;
