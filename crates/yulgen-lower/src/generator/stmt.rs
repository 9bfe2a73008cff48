use super::inline_asm::CopyTranslate;
use super::IRGeneratorForStatements;
use crate::ast::{Expression, Statement, VariableDeclaration};
use crate::errors::{CodegenError, Result};
use crate::invariant;
use crate::variable::IRVariable;
use tracing::debug;
use yulgen_core::types::Type;
use yulgen_core::yul::{self, Case, Literal};

impl<'c> IRGeneratorForStatements<'c> {
    pub(crate) fn visit_statement(&mut self, statement: &Statement) -> Result<()> {
        invariant!(
            self.current_lvalue.is_none(),
            "LValue pending before {} statement",
            statement_name(statement)
        );
        debug!(statement = statement_name(statement), "lowering statement");

        match statement {
            Statement::Block(statements) => {
                let block = self.in_block(|generator| {
                    for statement in statements {
                        generator.visit_statement(statement)?;
                    }
                    Ok(())
                })?;
                self.code.push(yul::Statement::Block(block));
            }
            Statement::VariableDeclaration {
                declarations,
                initial_value,
            } => self.visit_variable_declaration(declarations, initial_value.as_ref())?,
            Statement::Expression(expression) | Statement::Emit(expression) => {
                self.visit_expression(expression)?
            }
            Statement::If {
                condition,
                true_body,
                false_body,
            } => {
                self.visit_expression(condition)?;
                let condition = self.expression_as_single(condition, &Type::Bool)?;
                let true_block = self.in_block(|generator| generator.visit_body(true_body))?;
                match false_body {
                    Some(false_body) => {
                        let false_block =
                            self.in_block(|generator| generator.visit_body(false_body))?;
                        self.code.push(yul::Statement::Switch {
                            expression: condition,
                            cases: vec![
                                Case {
                                    value: Some(Literal::decimal(0u32)),
                                    body: false_block,
                                },
                                Case {
                                    value: None,
                                    body: true_block,
                                },
                            ],
                        });
                    }
                    None => self.code.push(yul::Statement::If {
                        condition,
                        body: true_block,
                    }),
                }
            }
            Statement::For {
                init,
                condition,
                loop_expression,
                body,
            } => self.generate_loop(
                condition.as_ref(),
                body,
                init.as_deref(),
                loop_expression.as_ref(),
                false,
            )?,
            Statement::While {
                condition,
                body,
                is_do_while,
            } => self.generate_loop(Some(condition), body, None, None, *is_do_while)?,
            Statement::Continue => self.code.push(yul::Statement::Continue),
            Statement::Break => self.code.push(yul::Statement::Break),
            Statement::Return {
                expression,
                return_parameters,
            } => self.visit_return(expression.as_ref(), return_parameters)?,
            Statement::InlineAssembly(assembly) => {
                let block = CopyTranslate::new(&*self.context, &assembly.external_references)
                    .translate(&assembly.operations)?;
                self.code.push(yul::Statement::Block(block));
            }
        }

        invariant!(
            self.current_lvalue.is_none(),
            "LValue not consumed by {} statement",
            statement_name(statement)
        );
        Ok(())
    }

    /// Bodies of control structures are emitted straight into the construct's own block.
    fn visit_body(&mut self, body: &Statement) -> Result<()> {
        match body {
            Statement::Block(statements) => {
                for statement in statements {
                    self.visit_statement(statement)?;
                }
                Ok(())
            }
            other => self.visit_statement(other),
        }
    }

    fn visit_variable_declaration(
        &mut self,
        declarations: &[Option<VariableDeclaration>],
        initial_value: Option<&Expression>,
    ) -> Result<()> {
        let Some(value) = initial_value else {
            for declaration in declarations.iter().flatten() {
                let local = self.context.add_local_variable(declaration)?;
                self.declare(&local);
            }
            return Ok(());
        };

        self.visit_expression(value)?;
        let value = IRVariable::from_expression(value);
        if let [single] = declarations {
            let declaration = single
                .as_ref()
                .ok_or_else(|| CodegenError::invariant("Single declaration without variable"))?;
            let local = self.context.add_local_variable(declaration)?;
            return self.define(&local, &value);
        }
        for (index, declaration) in declarations.iter().enumerate() {
            if let Some(declaration) = declaration {
                let local = self.context.add_local_variable(declaration)?;
                self.define(&local, &value.tuple_component(index)?)?;
            }
        }
        Ok(())
    }

    fn visit_return(
        &mut self,
        expression: Option<&Expression>,
        return_parameters: &[VariableDeclaration],
    ) -> Result<()> {
        if let Some(expression) = expression {
            self.visit_expression(expression)?;
            let value = IRVariable::from_expression(expression);
            match return_parameters {
                [] => {
                    return Err(CodegenError::invariant(
                        "Return value in a function without return parameters",
                    ))
                }
                [single] => {
                    let target = self.context.local_variable(single)?;
                    self.assign(&target, &value)?;
                }
                parameters => {
                    for (index, parameter) in parameters.iter().enumerate() {
                        let target = self.context.local_variable(parameter)?;
                        self.assign(&target, &value.tuple_component(index)?)?;
                    }
                }
            }
        }
        self.code.push(yul::Statement::Leave);
        Ok(())
    }

    /// Lowers `for`, `while` and `do ... while` to one `for { init } 1 { post } { body }` shape.
    fn generate_loop(
        &mut self,
        condition: Option<&Expression>,
        body: &Statement,
        init: Option<&Statement>,
        loop_expression: Option<&Expression>,
        is_do_while: bool,
    ) -> Result<()> {
        let first_run = if is_do_while {
            let name = self.context.new_yul_variable();
            self.code
                .define(vec![name.clone()], yul::Expression::number(1u32));
            Some(name)
        } else {
            None
        };

        let pre = self.in_block(|generator| match init {
            Some(init) => generator.visit_statement(init),
            None => Ok(()),
        })?;
        let post = self.in_block(|generator| {
            if let Some(loop_expression) = loop_expression {
                generator.visit_expression(loop_expression)?;
                invariant!(
                    generator.current_lvalue.is_none(),
                    "LValue not consumed by loop expression"
                );
            }
            Ok(())
        })?;
        let body_block = self.in_block(|generator| {
            if let Some(condition) = condition {
                let check = generator.in_block(|generator| {
                    generator.visit_expression(condition)?;
                    let condition = generator.expression_as_single(condition, &Type::Bool)?;
                    generator.code.push(yul::Statement::If {
                        condition: yul::Expression::call("iszero", vec![condition]),
                        body: yul::Block::new(vec![yul::Statement::Break]),
                    });
                    Ok(())
                })?;
                match &first_run {
                    Some(first_run) => {
                        generator.code.push(yul::Statement::If {
                            condition: yul::Expression::call(
                                "iszero",
                                vec![yul::Expression::ident(first_run.clone())],
                            ),
                            body: check,
                        });
                        generator
                            .code
                            .assign(vec![first_run.clone()], yul::Expression::number(0u32));
                    }
                    None => {
                        for statement in check.statements {
                            generator.code.push(statement);
                        }
                    }
                }
            }
            generator.visit_body(body)
        })?;

        self.code.push(yul::Statement::ForLoop {
            pre,
            condition: yul::Expression::number(1u32),
            post,
            body: body_block,
        });
        Ok(())
    }
}

fn statement_name(statement: &Statement) -> &'static str {
    match statement {
        Statement::Block(_) => "block",
        Statement::VariableDeclaration { .. } => "variable declaration",
        Statement::Expression(_) => "expression",
        Statement::If { .. } => "if",
        Statement::For { .. } => "for",
        Statement::While {
            is_do_while: true, ..
        } => "do-while",
        Statement::While { .. } => "while",
        Statement::Continue => "continue",
        Statement::Break => "break",
        Statement::Return { .. } => "return",
        Statement::Emit(_) => "emit",
        Statement::InlineAssembly(_) => "inline assembly",
    }
}
