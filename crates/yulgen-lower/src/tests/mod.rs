/*! Unit tests for value layouts, the generation context and single-node lowering.
 *
 * Each test builds a small typed tree, lowers it with a fresh context and checks the emitted Yul
 * text or the helper functions that were requested along the way.
 */

#![allow(unused_imports)]


use crate::ast::{Statement, VariableDeclaration};
use crate::context::{GenerationContext, IRGenerationContext};
use crate::errors::Result;
use crate::generator::IRGeneratorForStatements;
use yulgen_emit::{Emitter, YulEmitter};

/// Registers `locals` and lowers `statements` as one function body.
pub(crate) fn lower_with(
    context: &mut IRGenerationContext,
    locals: &[&VariableDeclaration],
    statements: &[Statement],
) -> Result<String> {
    for local in locals {
        context.add_local_variable(local)?;
    }
    let block = IRGeneratorForStatements::new(context).generate(statements)?;
    Ok(YulEmitter::plain()
        .emit_to_string(&block)
        .expect("emitting lowered block"))
}

pub(crate) fn lower(locals: &[&VariableDeclaration], statements: &[Statement]) -> Result<String> {
    lower_with(&mut IRGenerationContext::with_defaults(), locals, statements)
}
