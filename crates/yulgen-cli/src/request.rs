//! The JSON document the CLI lowers: one function body plus the contract facts it depends on.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use yulgen_core::yul::Block;
use yulgen_lower::ast::{DeclId, Expression, FunctionRef, StateVariable, VariableDeclaration};
use yulgen_lower::{
    lower_function, FunctionDefinition, GeneratorConfig, HelperRegistry, HelperRequest,
    IRGenerationContext, IRGeneratorForStatements,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoweringRequest {
    #[serde(default)]
    pub config: GeneratorConfig,
    #[serde(default)]
    pub state_variables: Vec<StateVariableLayout>,
    #[serde(default)]
    pub overrides: Vec<Override>,
    pub function: FunctionDefinition,
}

/// Where a state variable lives, and its initial value if it has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateVariableLayout {
    pub declaration: VariableDeclaration,
    pub slot: u64,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub value: Option<Expression>,
}

/// Calls to `base` resolve to `target` in the most derived contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Override {
    pub base: DeclId,
    pub target: FunctionRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoweringOutput {
    pub function: String,
    /// Storage writes for state variables that carry an initial value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initializer: Option<Block>,
    pub body: Block,
    pub helpers: Vec<HelperRequest>,
    pub function_queue: Vec<String>,
}

impl LoweringRequest {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).context("Invalid lowering request")
    }

    pub fn lower(&self) -> Result<LoweringOutput> {
        let helpers = Arc::new(HelperRegistry::new());
        let mut context = IRGenerationContext::new(self.config.clone(), Arc::clone(&helpers));
        for variable in &self.state_variables {
            context.add_state_variable(variable.declaration.id, variable.slot, variable.offset);
        }
        for entry in &self.overrides {
            context.add_override(entry.base, entry.target.clone());
        }

        let initializer = self.lower_initializers(&mut context)?;
        debug!(
            function = %self.function.name,
            evm_version = %self.config.evm_version,
            "lowering request"
        );
        let body = lower_function(&self.function, &mut context)
            .with_context(|| format!("Failed to lower function {}", self.function.name))?;

        Ok(LoweringOutput {
            function: self.function.name.clone(),
            initializer,
            body,
            helpers: helpers.requests(),
            function_queue: context.function_generation_queue(),
        })
    }

    fn lower_initializers(&self, context: &mut IRGenerationContext) -> Result<Option<Block>> {
        let initialized: Vec<StateVariable> = self
            .state_variables
            .iter()
            .filter(|variable| variable.value.is_some())
            .map(|variable| StateVariable {
                declaration: variable.declaration.clone(),
                value: variable.value.clone(),
            })
            .collect();
        if initialized.is_empty() {
            return Ok(None);
        }

        let mut generator = IRGeneratorForStatements::new(context);
        for variable in &initialized {
            generator
                .initialize_state_var(variable)
                .with_context(|| format!("Failed to initialize {}", variable.declaration.name))?;
        }
        Ok(Some(generator.finish()?))
    }
}
