/*! Lowering of statements and expressions.
 *
 * One `IRGeneratorForStatements` walks one function body depth-first and appends Yul to a single
 * buffer. Every expression node leaves its result in variables named after the node, or, when the
 * node is the target of an assignment, as the one pending lvalue that its parent consumes.
 */

mod access;
mod call;
mod expr;
pub mod inline_asm;
mod lvalue;
mod stmt;

use crate::ast::{Expression, StateVariable, Statement};
use crate::context::GenerationContext;
use crate::errors::Result;
use crate::helpers::{AbiFunctions, UtilFunctions};
use crate::invariant;
use crate::lvalue::IRLValue;
use crate::variable::{IRVariable, VariablePart};
use yulgen_core::builder::BlockBuilder;
use yulgen_core::types::Type;
use yulgen_core::yul;

pub struct IRGeneratorForStatements<'c> {
    context: &'c mut dyn GenerationContext,
    code: BlockBuilder,
    current_lvalue: Option<IRLValue>,
}

impl<'c> IRGeneratorForStatements<'c> {
    pub fn new(context: &'c mut dyn GenerationContext) -> Self {
        Self {
            context,
            code: BlockBuilder::new(),
            current_lvalue: None,
        }
    }

    /// Lowers a sequence of statements and returns the finished block.
    pub fn generate(mut self, statements: &[Statement]) -> Result<yul::Block> {
        for statement in statements {
            self.visit_statement(statement)?;
        }
        self.finish()
    }

    pub fn lower_statement(&mut self, statement: &Statement) -> Result<()> {
        self.visit_statement(statement)
    }

    /// Lowers a free-standing expression, e.g. for tests or constant folding callers.
    pub fn lower_expression(&mut self, expression: &Expression) -> Result<IRVariable> {
        self.visit_expression(expression)?;
        Ok(IRVariable::from_expression(expression))
    }

    /// Writes the initial value of a state variable to its storage location.
    pub fn initialize_state_var(&mut self, variable: &StateVariable) -> Result<()> {
        let declaration = &variable.declaration;
        invariant!(
            self.context.is_state_variable(declaration.id),
            "{} is not a state variable",
            declaration.name
        );
        invariant!(
            !declaration.is_constant,
            "Constant {} has no storage to initialize",
            declaration.name
        );
        if let Some(value) = &variable.value {
            self.visit_expression(value)?;
            let converted = self.convert(&IRVariable::from_expression(value), &declaration.ty)?;
            let (slot, offset) = self.context.storage_location_of_variable(declaration.id)?;
            let lvalue = IRLValue::storage(
                declaration.ty.clone(),
                yul::Expression::hex(slot),
                crate::lvalue::StorageOffset::Static(offset),
            );
            self.write_to_lvalue(&lvalue, &converted)?;
        }
        Ok(())
    }

    /// Consumes the generator. Fails if an lvalue was produced but never used.
    pub fn finish(self) -> Result<yul::Block> {
        invariant!(
            self.current_lvalue.is_none(),
            "LValue of type {} not consumed",
            self.current_lvalue
                .as_ref()
                .map(|lvalue| lvalue.ty.to_string())
                .unwrap_or_default()
        );
        Ok(self.code.finish()?)
    }

    fn utils(&self) -> UtilFunctions<'_> {
        self.context.utils()
    }

    fn abi(&self) -> AbiFunctions<'_> {
        self.context.abi()
    }

    fn new_variable(&mut self, ty: Type) -> IRVariable {
        IRVariable::new(self.context.new_yul_variable(), ty)
    }

    /// Runs `build` with a fresh output frame and returns what it emitted.
    fn in_block<F>(&mut self, build: F) -> Result<yul::Block>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.code.open();
        build(self)?;
        Ok(self.code.close()?)
    }

    fn declare(&mut self, variable: &IRVariable) {
        self.code.declare(variable.stack_slots());
    }

    fn define(&mut self, variable: &IRVariable, value: &IRVariable) -> Result<()> {
        self.declare_assign(variable, value, true)
    }

    fn assign(&mut self, variable: &IRVariable, value: &IRVariable) -> Result<()> {
        self.declare_assign(variable, value, false)
    }

    /// Binds `variable` to an expression producing all of its words. A value without words
    /// still evaluates the expression for its effects.
    fn define_expression(&mut self, variable: &IRVariable, value: yul::Expression) {
        let slots = variable.stack_slots();
        if slots.is_empty() {
            self.code.expression(value);
        } else {
            self.code.define(slots, value);
        }
    }

    fn bind(&mut self, declare: bool, targets: Vec<String>, value: yul::Expression) {
        if declare {
            self.code.define(targets, value);
        } else {
            self.code.assign(targets, value);
        }
    }

    fn declare_assign(&mut self, lhs: &IRVariable, rhs: &IRVariable, declare: bool) -> Result<()> {
        if lhs.ty() == rhs.ty() {
            for (target, source) in lhs.parts().into_iter().zip(rhs.parts()) {
                match (target, source) {
                    (VariablePart::Word(target), VariablePart::Word(source)) => {
                        self.bind(declare, vec![target], yul::Expression::ident(source))
                    }
                    (VariablePart::Value(target), VariablePart::Value(source)) => {
                        self.declare_assign(&target, &source, declare)?
                    }
                    _ => invariant!(false, "Mismatched layouts for type {}", lhs.ty()),
                }
            }
        } else {
            let targets = lhs.stack_slots();
            if targets.is_empty() {
                return Ok(());
            }
            let conversion = self.utils().conversion_function(rhs.ty(), lhs.ty());
            self.bind(declare, targets, yul::Expression::call(conversion, rhs.expressions()));
        }
        Ok(())
    }

    /// Returns `variable` unchanged if it already has type `to`, else a fresh converted copy.
    fn convert(&mut self, variable: &IRVariable, to: &Type) -> Result<IRVariable> {
        if variable.ty() == to {
            return Ok(variable.clone());
        }
        let converted = self.new_variable(to.clone());
        self.define(&converted, variable)?;
        Ok(converted)
    }

    /// The words of an already lowered expression, converted to `to`.
    fn expression_as_type(&mut self, expression: &Expression, to: &Type) -> Result<Vec<yul::Expression>> {
        let variable = IRVariable::from_expression(expression);
        if variable.ty() == to {
            return Ok(variable.expressions());
        }
        if to.size_on_stack() == 1 {
            let conversion = self.utils().conversion_function(variable.ty(), to);
            return Ok(vec![yul::Expression::call(conversion, variable.expressions())]);
        }
        Ok(self.convert(&variable, to)?.expressions())
    }

    fn expression_as_single(&mut self, expression: &Expression, to: &Type) -> Result<yul::Expression> {
        let mut words = self.expression_as_type(expression, to)?;
        invariant!(
            words.len() == 1,
            "Expected a single word for {}, got {}",
            to,
            words.len()
        );
        Ok(words.remove(0))
    }
}
