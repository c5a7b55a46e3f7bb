pub mod check;
pub mod tokenize;
