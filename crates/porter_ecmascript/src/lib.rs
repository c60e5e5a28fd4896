mod ecma_compiler;
mod require_scanner;

pub use crate::ecma_compiler::{CodegenReturn, EcmaCompiler};
