pub mod chat;
pub mod eval;
pub mod index;
pub mod tools;
