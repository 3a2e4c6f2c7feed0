//! A compiler front end for the Jack language. It turns the source text of one class into
//! instructions for the stack-based virtual machine:
//!
//! ```text
//! source text -> tokens -> syntax tree -> VM instructions
//! ```
//!
//! Each class is compiled on its own with fresh state, so compiling the same source twice
//! always gives identical output. Reading files and writing the results is left to the caller
//! (see the `jackc` binary).

pub mod cli;
pub mod codegen;
pub mod error;
pub mod syntax_tree;
pub mod tokens;

pub use codegen::{render, VmInstruction};
pub use error::{CodegenError, CompileError, LexError, LexErrorKind, ParseError, StageError};

/// Compiles one class into VM instructions. `filename` only labels errors.
pub fn compile_to_instructions(
    source: &str,
    filename: &str,
) -> Result<Vec<VmInstruction>, CompileError> {
    let tokens = tokens::tokenize(source).map_err(|e| CompileError::new(filename, e))?;
    let class = syntax_tree::parse(&tokens).map_err(|e| CompileError::new(filename, e))?;
    log::debug!("compiling class {} from {}", class.name, filename);
    codegen::generate_code(&class).map_err(|e| CompileError::new(filename, e))
}

/// Compiles one class into VM code text, one instruction per line.
pub fn compile(source: &str, filename: &str) -> Result<String, CompileError> {
    compile_to_instructions(source, filename).map(|instructions| render(&instructions))
}

/// Produces the XML token listing of one class.
pub fn tokens_xml(source: &str, filename: &str) -> Result<String, CompileError> {
    tokens::tokenize(source)
        .map(|program| program.to_xml())
        .map_err(|e| CompileError::new(filename, e))
}
