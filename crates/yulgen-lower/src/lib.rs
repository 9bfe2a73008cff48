/*! Lower typed contract code to Yul.
 *
 * A type-checked function body still hides most of what the machine does: values span several
 * stack words, assignments target storage slots or memory, `&&` must not evaluate its right side
 * eagerly, and every arithmetic operation needs an overflow check. This crate walks the typed tree
 * and makes all of that explicit as structured Yul, calling into shared helper functions for
 * conversions, checked arithmetic and ABI coding.
 */

pub mod ast;
pub mod config;
pub mod context;
pub mod errors;
pub mod generator;
pub mod helpers;
pub mod lvalue;
pub mod variable;

pub use ast::build::AstBuilder;
pub use ast::{Expression, FunctionDefinition, StateVariable, Statement};
pub use config::{EvmVersion, GeneratorConfig};
pub use context::{GenerationContext, IRGenerationContext};
pub use errors::{CodegenError, Result};
pub use generator::IRGeneratorForStatements;
pub use helpers::{HelperOp, HelperRegistry, HelperRequest};
pub use lvalue::{IRLValue, LValueKind, StorageOffset};
pub use variable::IRVariable;

use tracing::debug;
use yulgen_core::yul;

/// Lowers the body of `function`. Parameters and return parameters become locals first.
pub fn lower_function(
    function: &FunctionDefinition,
    context: &mut dyn GenerationContext,
) -> Result<yul::Block> {
    debug!(function = %function.name, id = %function.id, "lowering function body");
    for parameter in function
        .parameters
        .iter()
        .chain(&function.return_parameters)
    {
        context.add_local_variable(parameter)?;
    }
    IRGeneratorForStatements::new(context).generate(&function.body)
}

#[cfg(test)]
mod tests;
