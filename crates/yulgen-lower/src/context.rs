/*! Compiler-wide state the lowering engine consults.
 *
 * Statement lowering works on one function body at a time but needs answers that belong to the
 * whole compilation: where state variables live, which override a virtual call resolves to, what
 * the target EVM supports, and which helper functions already exist. `GenerationContext` is that
 * narrow interface; `IRGenerationContext` is the default implementation.
 */

use crate::ast::{DeclId, FunctionRef, VariableDeclaration};
use crate::config::{EvmVersion, GeneratorConfig};
use crate::errors::{CodegenError, Result};
use crate::helpers::{AbiFunctions, HelperRegistry, UtilFunctions};
use crate::invariant;
use crate::variable::IRVariable;
use indexmap::IndexMap;
use num_bigint::BigUint;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use yulgen_core::NameDispenser;

pub trait GenerationContext {
    /// A Yul identifier never handed out before.
    fn new_yul_variable(&mut self) -> String;

    fn add_local_variable(&mut self, declaration: &VariableDeclaration) -> Result<IRVariable>;
    fn is_local_variable(&self, declaration: DeclId) -> bool;
    fn local_variable(&self, declaration: &VariableDeclaration) -> Result<IRVariable>;

    fn is_state_variable(&self, declaration: DeclId) -> bool;
    /// Slot and byte offset assigned to a state variable.
    fn storage_location_of_variable(&self, declaration: DeclId) -> Result<(BigUint, u32)>;

    /// Name of the function a call to `function` dispatches to, after override resolution.
    fn virtual_function_name(&mut self, function: &FunctionRef) -> String;
    /// Numeric identifier of the resolved function, used for internal function pointers.
    fn virtual_function_id(&mut self, function: &FunctionRef) -> u64;

    /// Name of the dispatcher for internal function pointers of the given arity.
    fn internal_dispatch(&mut self, parameters: usize, returns: usize) -> String;

    fn evm_version(&self) -> EvmVersion;
    fn helpers(&self) -> &HelperRegistry;

    fn utils(&self) -> UtilFunctions<'_> {
        UtilFunctions::new(self.helpers())
    }

    fn abi(&self) -> AbiFunctions<'_> {
        AbiFunctions::new(self.helpers())
    }
}

pub struct IRGenerationContext {
    config: GeneratorConfig,
    helpers: Arc<HelperRegistry>,
    names: NameDispenser,
    local_variables: HashMap<DeclId, IRVariable>,
    state_variables: HashMap<DeclId, (BigUint, u32)>,
    overrides: HashMap<DeclId, FunctionRef>,
    function_queue: IndexMap<DeclId, String>,
}

impl IRGenerationContext {
    pub fn new(config: GeneratorConfig, helpers: Arc<HelperRegistry>) -> Self {
        Self {
            config,
            helpers,
            names: NameDispenser::new(),
            local_variables: HashMap::new(),
            state_variables: HashMap::new(),
            overrides: HashMap::new(),
            function_queue: IndexMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default(), Arc::new(HelperRegistry::new()))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn shared_helpers(&self) -> Arc<HelperRegistry> {
        Arc::clone(&self.helpers)
    }

    pub fn add_state_variable(&mut self, declaration: DeclId, slot: impl Into<BigUint>, offset: u32) {
        self.state_variables.insert(declaration, (slot.into(), offset));
    }

    /// Makes calls to `base` dispatch to `target`.
    pub fn add_override(&mut self, base: DeclId, target: FunctionRef) {
        self.overrides.insert(base, target);
    }

    /// Functions referenced so far, in first-reference order, that still need code.
    pub fn function_generation_queue(&self) -> Vec<String> {
        self.function_queue.values().cloned().collect()
    }

    /// Forgets the locals of the previous function body.
    pub fn reset_locals(&mut self) {
        self.local_variables.clear();
    }

    fn resolve<'f>(&'f self, function: &'f FunctionRef) -> &'f FunctionRef {
        self.overrides.get(&function.id).unwrap_or(function)
    }

    fn function_name(function: &FunctionRef) -> String {
        format!("fun_{}_{}", function.name, function.id)
    }
}

impl GenerationContext for IRGenerationContext {
    fn new_yul_variable(&mut self) -> String {
        self.names.fresh()
    }

    fn add_local_variable(&mut self, declaration: &VariableDeclaration) -> Result<IRVariable> {
        invariant!(
            !self.local_variables.contains_key(&declaration.id),
            "Local variable {} added multiple times",
            declaration.name
        );
        let variable = IRVariable::local(declaration);
        self.local_variables
            .insert(declaration.id, variable.clone());
        Ok(variable)
    }

    fn is_local_variable(&self, declaration: DeclId) -> bool {
        self.local_variables.contains_key(&declaration)
    }

    fn local_variable(&self, declaration: &VariableDeclaration) -> Result<IRVariable> {
        self.local_variables
            .get(&declaration.id)
            .cloned()
            .ok_or_else(|| {
                CodegenError::invariant(format!("Unknown local variable {}", declaration.name))
            })
    }

    fn is_state_variable(&self, declaration: DeclId) -> bool {
        self.state_variables.contains_key(&declaration)
    }

    fn storage_location_of_variable(&self, declaration: DeclId) -> Result<(BigUint, u32)> {
        self.state_variables
            .get(&declaration)
            .cloned()
            .ok_or_else(|| {
                CodegenError::invariant(format!("No storage location for declaration {}", declaration))
            })
    }

    fn virtual_function_name(&mut self, function: &FunctionRef) -> String {
        let resolved = self.resolve(function).clone();
        let name = Self::function_name(&resolved);
        if !self.function_queue.contains_key(&resolved.id) {
            debug!(function = %name, "queued function for generation");
            self.function_queue.insert(resolved.id, name.clone());
        }
        name
    }

    fn virtual_function_id(&mut self, function: &FunctionRef) -> u64 {
        let resolved = self.resolve(function).clone();
        self.function_queue
            .entry(resolved.id)
            .or_insert_with(|| Self::function_name(&resolved));
        u64::from(resolved.id.0)
    }

    fn internal_dispatch(&mut self, parameters: usize, returns: usize) -> String {
        self.utils().internal_dispatch_function(parameters, returns)
    }

    fn evm_version(&self) -> EvmVersion {
        self.config.evm_version
    }

    fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }
}
