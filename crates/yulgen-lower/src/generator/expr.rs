use super::IRGeneratorForStatements;
use crate::ast::{
    AssignmentOperator, BinaryOperator, Expression, ExpressionKind, UnaryOperator,
};
use crate::errors::{CodegenError, Result};
use crate::lvalue::{IRLValue, LValueKind};
use crate::variable::IRVariable;
use crate::{ensure_implemented, invariant};
use num_bigint::BigUint;
use yulgen_core::types::{FunctionKind, Type};
use yulgen_core::yul::{self, Case, Literal};

impl<'c> IRGeneratorForStatements<'c> {
    pub(crate) fn visit_expression(&mut self, expression: &Expression) -> Result<()> {
        match &expression.kind {
            ExpressionKind::Conditional {
                condition,
                true_expression,
                false_expression,
            } => self.visit_conditional(expression, condition, true_expression, false_expression),
            ExpressionKind::Assignment {
                operator,
                left,
                right,
            } => self.visit_assignment(expression, *operator, left, right),
            ExpressionKind::Tuple {
                components,
                is_inline_array,
            } => self.visit_tuple(expression, components, *is_inline_array),
            ExpressionKind::UnaryOperation {
                operator,
                prefix,
                sub_expression,
            } => {
                self.visit_expression(sub_expression)?;
                self.visit_unary_operation(expression, *operator, *prefix, sub_expression)
            }
            ExpressionKind::BinaryOperation {
                operator,
                left,
                right,
                common_type,
            } => self.visit_binary_operation(expression, *operator, left, right, common_type),
            ExpressionKind::FunctionCall { .. } => self.visit_function_call(expression),
            ExpressionKind::FunctionCallOptions {
                expression: callee,
                names,
                options,
            } => self.visit_function_call_options(expression, callee, names, options),
            ExpressionKind::New { .. } | ExpressionKind::ElementaryTypeName { .. } => Ok(()),
            ExpressionKind::MemberAccess {
                expression: base,
                member,
                referenced_declaration,
            } => {
                self.visit_expression(base)?;
                self.visit_member_access(expression, base, member, referenced_declaration.as_ref())
            }
            ExpressionKind::IndexAccess { base, index } => {
                self.visit_expression(base)?;
                if let Some(index) = index {
                    self.visit_expression(index)?;
                }
                self.visit_index_access(expression, base, index.as_deref())
            }
            ExpressionKind::IndexRangeAccess { .. } => {
                Err(CodegenError::unimplemented("index range access"))
            }
            ExpressionKind::Identifier { name, declaration } => {
                self.visit_identifier(expression, name, declaration)
            }
            ExpressionKind::Literal { value } => self.visit_literal(expression, value),
        }
    }

    fn visit_conditional(
        &mut self,
        expression: &Expression,
        condition: &Expression,
        true_expression: &Expression,
        false_expression: &Expression,
    ) -> Result<()> {
        self.visit_expression(condition)?;
        let condition = self.expression_as_single(condition, &Type::Bool)?;

        let result = IRVariable::from_expression(expression);
        self.declare(&result);

        let false_branch = self.in_block(|generator| {
            generator.visit_expression(false_expression)?;
            generator.assign(&result, &IRVariable::from_expression(false_expression))
        })?;
        let true_branch = self.in_block(|generator| {
            generator.visit_expression(true_expression)?;
            generator.assign(&result, &IRVariable::from_expression(true_expression))
        })?;

        self.code.push(yul::Statement::Switch {
            expression: condition,
            cases: vec![
                Case {
                    value: Some(Literal::decimal(0u32)),
                    body: false_branch,
                },
                Case {
                    value: None,
                    body: true_branch,
                },
            ],
        });
        Ok(())
    }

    fn visit_assignment(
        &mut self,
        expression: &Expression,
        operator: AssignmentOperator,
        left: &Expression,
        right: &Expression,
    ) -> Result<()> {
        self.visit_expression(right)?;
        let intermediate_type = right.ty.closest_temporary_type(&left.ty);
        let value = self.convert(&IRVariable::from_expression(right), &intermediate_type)?;

        self.visit_expression(left)?;
        let lvalue = self.take_lvalue()?;

        if let Some(binary_operator) = operator.binary_operator() {
            invariant!(
                intermediate_type == left.ty,
                "Compound assignment needs matching types, got {} and {}",
                intermediate_type,
                left.ty
            );
            let left_value = self.read_from_lvalue(&lvalue)?;
            let operation = self.binary_operation(
                binary_operator,
                &intermediate_type,
                left_value.expression()?,
                value.expression()?,
            )?;
            self.code.assign(vec![value.name()?], operation);
        }

        self.write_to_lvalue(&lvalue, &value)?;

        if !expression.ty.is_empty_tuple() {
            self.define(&IRVariable::from_expression(expression), &value)?;
        }
        Ok(())
    }

    fn visit_tuple(
        &mut self,
        expression: &Expression,
        components: &[Option<Expression>],
        is_inline_array: bool,
    ) -> Result<()> {
        ensure_implemented!(!is_inline_array, "inline arrays");
        let lvalue_requested = expression.lvalue_requested;
        if lvalue_requested {
            invariant!(
                self.current_lvalue.is_none(),
                "Pending lvalue before tuple assignment target"
            );
        }

        if components.len() == 1 {
            let component = components[0]
                .as_ref()
                .ok_or_else(|| CodegenError::invariant("Single-element tuple without element"))?;
            self.visit_expression(component)?;
            if lvalue_requested {
                invariant!(
                    self.current_lvalue.is_some(),
                    "Tuple component did not produce an lvalue"
                );
            } else {
                self.define(
                    &IRVariable::from_expression(expression),
                    &IRVariable::from_expression(component),
                )?;
            }
            return Ok(());
        }

        let mut lvalues = Vec::with_capacity(components.len());
        for (index, component) in components.iter().enumerate() {
            match component {
                Some(component) => {
                    self.visit_expression(component)?;
                    if lvalue_requested {
                        lvalues.push(Some(self.take_lvalue()?));
                    } else {
                        let target = IRVariable::from_expression(expression).tuple_component(index)?;
                        self.define(&target, &IRVariable::from_expression(component))?;
                    }
                }
                None => {
                    if lvalue_requested {
                        lvalues.push(None);
                    }
                }
            }
        }
        if lvalue_requested {
            self.current_lvalue = Some(IRLValue::tuple(expression.ty.clone(), lvalues));
        }
        Ok(())
    }

    fn visit_unary_operation(
        &mut self,
        expression: &Expression,
        operator: UnaryOperator,
        prefix: bool,
        sub_expression: &Expression,
    ) -> Result<()> {
        let result_type = &expression.ty;

        if operator == UnaryOperator::Delete {
            let lvalue = self.take_lvalue()?;
            if let LValueKind::Storage { slot, offset } = &lvalue.kind {
                let function = self.utils().storage_set_to_zero_function(&lvalue.ty);
                self.code.expression(yul::Expression::call(
                    function,
                    vec![slot.clone(), offset.expression()],
                ));
            } else {
                let zero = self.new_variable(lvalue.ty.clone());
                let function = self.utils().zero_value_function(&lvalue.ty);
                self.define_expression(&zero, yul::Expression::call(function, Vec::new()));
                self.write_to_lvalue(&lvalue, &zero)?;
            }
            return Ok(());
        }

        match result_type {
            Type::RationalNumber(_) => {
                let value = literal_value(result_type)?;
                self.define_expression(
                    &IRVariable::from_expression(expression),
                    yul::Expression::hex(value),
                );
                Ok(())
            }
            Type::Integer { .. } => {
                invariant!(
                    *result_type == sub_expression.ty,
                    "Result type {} differs from operand type {}",
                    result_type,
                    sub_expression.ty
                );
                match operator {
                    UnaryOperator::Inc | UnaryOperator::Dec => {
                        let lvalue = self.take_lvalue()?;
                        let original = self.read_from_lvalue(&lvalue)?;
                        let function = if operator == UnaryOperator::Inc {
                            self.utils().increment_checked_function(result_type)
                        } else {
                            self.utils().decrement_checked_function(result_type)
                        };
                        let modified = self.new_variable(original.ty().clone());
                        self.define_expression(
                            &modified,
                            yul::Expression::call(function, original.expressions()),
                        );
                        self.write_to_lvalue(&lvalue, &modified)?;
                        let result = if prefix { &modified } else { &original };
                        self.define(&IRVariable::from_expression(expression), result)
                    }
                    UnaryOperator::BitNot => {
                        self.append_simple_unary_operation(expression, operator, sub_expression)
                    }
                    UnaryOperator::Add => Err(CodegenError::invariant(
                        "Use of unary + is disallowed.",
                    )),
                    UnaryOperator::Sub => {
                        let function = self.utils().negate_number_checked_function(result_type);
                        let operand = IRVariable::from_expression(sub_expression).expression()?;
                        self.define_expression(
                            &IRVariable::from_expression(expression),
                            yul::Expression::call(function, vec![operand]),
                        );
                        Ok(())
                    }
                    _ => Err(CodegenError::unimplemented(format!(
                        "unary operator {} on {}",
                        operator, result_type
                    ))),
                }
            }
            Type::Bool => {
                invariant!(
                    operator != UnaryOperator::BitNot,
                    "Bitwise not on a boolean"
                );
                self.append_simple_unary_operation(expression, operator, sub_expression)
            }
            _ => Err(CodegenError::unimplemented(format!(
                "unary operator {} on {}",
                operator, result_type
            ))),
        }
    }

    fn append_simple_unary_operation(
        &mut self,
        expression: &Expression,
        operator: UnaryOperator,
        sub_expression: &Expression,
    ) -> Result<()> {
        let builtin = match operator {
            UnaryOperator::Not => "iszero",
            UnaryOperator::BitNot => "not",
            other => {
                return Err(CodegenError::invariant(format!(
                    "Invalid simple unary operator {}",
                    other
                )))
            }
        };
        let cleanup = self.utils().cleanup_function(&expression.ty);
        let operand = IRVariable::from_expression(sub_expression).expression()?;
        self.define_expression(
            &IRVariable::from_expression(expression),
            yul::Expression::call(cleanup, vec![yul::Expression::call(builtin, vec![operand])]),
        );
        Ok(())
    }

    fn visit_binary_operation(
        &mut self,
        expression: &Expression,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
        common_type: &Type,
    ) -> Result<()> {
        if operator.is_boolean() {
            return self.append_and_or_operator_code(expression, operator, left, right);
        }

        self.visit_expression(left)?;
        self.visit_expression(right)?;

        if let Type::RationalNumber(_) = common_type {
            let value = literal_value(common_type)?;
            self.define_expression(
                &IRVariable::from_expression(expression),
                yul::Expression::hex(value),
            );
            return Ok(());
        }

        if operator.is_comparison() {
            if let Type::Function(function) = common_type {
                invariant!(
                    matches!(operator, BinaryOperator::Equal | BinaryOperator::NotEqual),
                    "Invalid comparison {} on function pointers",
                    operator
                );
                invariant!(
                    function.kind != FunctionKind::External,
                    "External function comparison not allowed"
                );
            }
            invariant!(
                common_type.is_value_type(),
                "Comparison of non-value type {}",
                common_type
            );
            let signed = common_type.is_signed_integer();
            let left_word = self.expression_as_single(left, common_type)?;
            let right_word = self.expression_as_single(right, common_type)?;
            let call = |name: &str| yul::Expression::call(name, vec![left_word.clone(), right_word.clone()]);
            let iszero = |inner: yul::Expression| yul::Expression::call("iszero", vec![inner]);
            let comparison = match operator {
                BinaryOperator::Equal => call("eq"),
                BinaryOperator::NotEqual => iszero(call("eq")),
                BinaryOperator::GreaterThanOrEqual => iszero(call(if signed { "slt" } else { "lt" })),
                BinaryOperator::LessThanOrEqual => iszero(call(if signed { "sgt" } else { "gt" })),
                BinaryOperator::GreaterThan => call(if signed { "sgt" } else { "gt" }),
                BinaryOperator::LessThan => call(if signed { "slt" } else { "lt" }),
                other => {
                    return Err(CodegenError::invariant(format!(
                        "Unknown comparison operator {}",
                        other
                    )))
                }
            };
            self.define_expression(&IRVariable::from_expression(expression), comparison);
            return Ok(());
        }

        let left_word = self.expression_as_single(left, common_type)?;
        let right_word = self.expression_as_single(right, common_type)?;
        let operation = self.binary_operation(operator, common_type, left_word, right_word)?;
        self.define_expression(&IRVariable::from_expression(expression), operation);
        Ok(())
    }

    /// `a && b` and `a || b` only evaluate `b` when `a` does not decide the result.
    fn append_and_or_operator_code(
        &mut self,
        expression: &Expression,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> Result<()> {
        self.visit_expression(left)?;

        let value = IRVariable::from_expression(expression);
        self.define(&value, &IRVariable::from_expression(left))?;

        let current = value.expression()?;
        let condition = if operator == BinaryOperator::Or {
            yul::Expression::call("iszero", vec![current])
        } else {
            current
        };
        let body = self.in_block(|generator| {
            generator.visit_expression(right)?;
            generator.assign(&value, &IRVariable::from_expression(right))
        })?;
        self.code.push(yul::Statement::If { condition, body });
        Ok(())
    }

    /// Arithmetic on already converted operands, routed through the checked helpers.
    pub(super) fn binary_operation(
        &mut self,
        operator: BinaryOperator,
        ty: &Type,
        left: yul::Expression,
        right: yul::Expression,
    ) -> Result<yul::Expression> {
        ensure_implemented!(
            matches!(ty, Type::Integer { .. }),
            "binary operator {} on {}",
            operator,
            ty
        );
        let utils = self.utils();
        let function = match operator {
            BinaryOperator::Add => utils.overflow_checked_int_add_function(ty),
            BinaryOperator::Sub => utils.overflow_checked_int_sub_function(ty),
            BinaryOperator::Mul => utils.overflow_checked_int_mul_function(ty),
            BinaryOperator::Div => utils.overflow_checked_int_div_function(ty),
            BinaryOperator::Mod => utils.checked_int_mod_function(ty),
            other => {
                return Err(CodegenError::unimplemented(format!(
                    "binary operator {} on {}",
                    other, ty
                )))
            }
        };
        Ok(yul::Expression::call(function, vec![left, right]))
    }

    fn visit_literal(&mut self, expression: &Expression, value: &str) -> Result<()> {
        let literal = match &expression.ty {
            Type::RationalNumber(_) => literal_value(&expression.ty)?,
            Type::Bool => match value {
                "true" => BigUint::from(1u32),
                "false" => BigUint::from(0u32),
                other => {
                    return Err(CodegenError::invariant(format!(
                        "Invalid boolean literal {}",
                        other
                    )))
                }
            },
            Type::Address { .. } => parse_address(value)?,
            Type::StringLiteral(_) => return Ok(()),
            other => {
                return Err(CodegenError::unimplemented(format!(
                    "literal of type {}",
                    other
                )))
            }
        };
        self.define_expression(
            &IRVariable::from_expression(expression),
            yul::Expression::hex(literal),
        );
        Ok(())
    }
}

fn literal_value(ty: &Type) -> Result<BigUint> {
    ty.literal_value()
        .ok_or_else(|| CodegenError::invariant(format!("{} has no literal value", ty)))
}

fn parse_address(text: &str) -> Result<BigUint> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| CodegenError::invariant(format!("Invalid address literal {}", text)))
}
