/*! Turn structured Yul back into source text.
 *
 * Lowering builds a tree so that nothing downstream has to re-parse strings. Printing is the one
 * place where that tree becomes text, whether for the assembler, a diff in a test, or a human
 * reading generated code in a terminal.
 */

pub mod config;
pub mod emitter;
pub mod yul_emitter;

pub use config::{EmitterConfig, IndentStyle};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use yul_emitter::YulEmitter;
