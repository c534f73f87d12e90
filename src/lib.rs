pub mod ast;
pub mod interpreter;
pub mod parser;
pub mod position;
pub mod tokenizer;
