/*! Inline assembly translation.
 *
 * Assembly blocks are already Yul, but they name source-level variables and may declare their
 * own identifiers, which could collide with generated ones. `CopyTranslate` copies the block,
 * renames every user identifier into the `usr$` namespace and replaces references to outer
 * variables with their generated names, or with storage slot/offset literals for `x_slot` and
 * `x_offset`.
 */

use crate::ast::{Declaration, ExternalReference};
use crate::context::GenerationContext;
use crate::errors::{CodegenError, Result};
use crate::invariant;
use indexmap::IndexMap;
use yulgen_core::yul::{self, is_evm_builtin, Block, Case, Expression, FunctionCall, Statement};

pub struct CopyTranslate<'a> {
    context: &'a dyn GenerationContext,
    references: &'a IndexMap<String, ExternalReference>,
}

impl<'a> CopyTranslate<'a> {
    pub fn new(
        context: &'a dyn GenerationContext,
        references: &'a IndexMap<String, ExternalReference>,
    ) -> Self {
        Self {
            context,
            references,
        }
    }

    pub fn translate(&self, block: &Block) -> Result<Block> {
        block
            .statements
            .iter()
            .map(|statement| self.statement(statement))
            .collect::<Result<Vec<_>>>()
            .map(Block::new)
    }

    fn statement(&self, statement: &Statement) -> Result<Statement> {
        Ok(match statement {
            Statement::Block(block) => Statement::Block(self.translate(block)?),
            Statement::VariableDeclaration { variables, value } => Statement::VariableDeclaration {
                variables: variables.iter().map(|name| self.name(name)).collect(),
                value: value.as_ref().map(|value| self.expression(value)).transpose()?,
            },
            Statement::Assignment { targets, value } => Statement::Assignment {
                targets: targets
                    .iter()
                    .map(|target| self.assignment_target(target))
                    .collect::<Result<_>>()?,
                value: self.expression(value)?,
            },
            Statement::Expression(expression) => Statement::Expression(self.expression(expression)?),
            Statement::If { condition, body } => Statement::If {
                condition: self.expression(condition)?,
                body: self.translate(body)?,
            },
            Statement::Switch { expression, cases } => Statement::Switch {
                expression: self.expression(expression)?,
                cases: cases
                    .iter()
                    .map(|case| {
                        Ok(Case {
                            value: case.value.clone(),
                            body: self.translate(&case.body)?,
                        })
                    })
                    .collect::<Result<_>>()?,
            },
            Statement::ForLoop {
                pre,
                condition,
                post,
                body,
            } => Statement::ForLoop {
                pre: self.translate(pre)?,
                condition: self.expression(condition)?,
                post: self.translate(post)?,
                body: self.translate(body)?,
            },
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body,
            } => Statement::FunctionDefinition {
                name: self.name(name),
                parameters: parameters.iter().map(|p| self.name(p)).collect(),
                returns: returns.iter().map(|r| self.name(r)).collect(),
                body: self.translate(body)?,
            },
            Statement::Break => Statement::Break,
            Statement::Continue => Statement::Continue,
            Statement::Leave => Statement::Leave,
        })
    }

    fn expression(&self, expression: &Expression) -> Result<Expression> {
        Ok(match expression {
            Expression::Literal(literal) => Expression::Literal(literal.clone()),
            Expression::Identifier(name) => match self.references.get(name) {
                Some(reference) => self.reference(name, reference)?,
                None => Expression::Identifier(self.name(name)),
            },
            Expression::FunctionCall(call) => Expression::FunctionCall(FunctionCall {
                function: self.name(&call.function),
                arguments: call
                    .arguments
                    .iter()
                    .map(|argument| self.expression(argument))
                    .collect::<Result<_>>()?,
            }),
        })
    }

    fn reference(&self, name: &str, reference: &ExternalReference) -> Result<Expression> {
        let variable = match &reference.declaration {
            Declaration::Variable(variable) => variable,
            other => {
                return Err(CodegenError::unimplemented(format!(
                    "assembly reference {} to {:?}",
                    name, other
                )))
            }
        };
        if reference.is_slot || reference.is_offset {
            invariant!(
                reference.is_slot != reference.is_offset,
                "Assembly reference {} is both slot and offset",
                name
            );
            let (slot, offset) = self.context.storage_location_of_variable(variable.id)?;
            return Ok(if reference.is_slot {
                Expression::Literal(yul::Literal::decimal(slot))
            } else {
                Expression::Literal(yul::Literal::decimal(offset))
            });
        }
        Ok(Expression::ident(self.context.local_variable(variable)?.name()?))
    }

    fn assignment_target(&self, target: &str) -> Result<String> {
        match self.references.get(target) {
            Some(reference) => match self.reference(target, reference)? {
                Expression::Identifier(name) => Ok(name),
                _ => Err(CodegenError::invariant(format!(
                    "Assembly cannot assign to {}",
                    target
                ))),
            },
            None => Ok(self.name(target)),
        }
    }

    fn name(&self, name: &str) -> String {
        if is_evm_builtin(name) {
            name.to_string()
        } else {
            format!("usr${}", name)
        }
    }
}
