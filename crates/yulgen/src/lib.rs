/*! Unified interface for lowering typed contract code to Yul.
 *
 * Single import for the whole pipeline: build or deserialize a typed function body, lower it with
 * a generation context, and print the resulting Yul block. The helper functions the body relies on
 * are collected in the shared registry for whoever assembles the final object.
 */

pub use yulgen_core as core;
pub use yulgen_emit as emit;
pub use yulgen_lower as lower;

pub use yulgen_core::{
    types::{DataLocation, FunctionKind, FunctionType, StateMutability, Type},
    yul::{Block, Expression, Literal, Statement},
};

pub use yulgen_emit::{Emitter, EmitterConfig, YulEmitter};

pub use yulgen_lower::{
    lower_function, AstBuilder, CodegenError, EvmVersion, FunctionDefinition, GeneratorConfig,
    HelperRegistry, HelperRequest, IRGenerationContext,
};

/// Lowers `function` with `context` and prints the body without colors.
pub fn lower_to_string(
    function: &FunctionDefinition,
    context: &mut IRGenerationContext,
) -> anyhow::Result<String> {
    let block = lower_function(function, context)?;
    YulEmitter::plain().emit_to_string(&block)
}
