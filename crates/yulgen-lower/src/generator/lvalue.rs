use super::IRGeneratorForStatements;
use crate::ast::Expression;
use crate::errors::{CodegenError, Result};
use crate::invariant;
use crate::lvalue::{IRLValue, LValueKind, StorageOffset};
use crate::variable::IRVariable;
use tracing::trace;
use yulgen_core::types::{DataLocation, Type};
use yulgen_core::yul;

impl<'c> IRGeneratorForStatements<'c> {
    /// Hands `lvalue` to the parent if the node is being assigned to, otherwise reads it into
    /// the node's value right away.
    pub(super) fn set_lvalue(&mut self, expression: &Expression, lvalue: IRLValue) -> Result<()> {
        if expression.lvalue_requested {
            invariant!(
                self.current_lvalue.is_none(),
                "Pending lvalue while setting a new one for expression {}",
                expression.id
            );
            invariant!(
                !lvalue.ty.data_stored_in(DataLocation::CallData),
                "Calldata values cannot be assigned to"
            );
            trace!(kind = lvalue.kind_name(), expression = %expression.id, "pending lvalue");
            self.current_lvalue = Some(lvalue);
            Ok(())
        } else {
            let value = self.read_from_lvalue(&lvalue)?;
            self.define(&IRVariable::from_expression(expression), &value)
        }
    }

    pub(super) fn take_lvalue(&mut self) -> Result<IRLValue> {
        self.current_lvalue
            .take()
            .ok_or_else(|| CodegenError::invariant("LValue not retrieved."))
    }

    pub(super) fn write_to_lvalue(&mut self, lvalue: &IRLValue, value: &IRVariable) -> Result<()> {
        match &lvalue.kind {
            LValueKind::Stack { variable } => self.assign(variable, value),
            LValueKind::Storage { slot, offset } => {
                let mut arguments = vec![slot.clone()];
                let function = match offset {
                    StorageOffset::Static(offset) => self
                        .utils()
                        .update_storage_value_function(&lvalue.ty, Some(*offset)),
                    StorageOffset::Dynamic(name) => {
                        arguments.push(yul::Expression::ident(name.clone()));
                        self.utils().update_storage_value_function(&lvalue.ty, None)
                    }
                };
                arguments.extend(value.expressions());
                self.code.expression(yul::Expression::call(function, arguments));
                Ok(())
            }
            LValueKind::Memory {
                address,
                byte_array_element,
            } => {
                if lvalue.ty.is_value_type() {
                    let prepared = self.new_variable(lvalue.ty.clone());
                    self.define(&prepared, value)?;
                    if *byte_array_element {
                        invariant!(
                            lvalue.ty == Type::FixedBytes(1),
                            "Byte array element of type {}",
                            lvalue.ty
                        );
                        self.code.expression(yul::Expression::call(
                            "mstore8",
                            vec![
                                address.clone(),
                                yul::Expression::call(
                                    "byte",
                                    vec![yul::Expression::number(0u32), prepared.expression()?],
                                ),
                            ],
                        ));
                    } else {
                        let function = self.utils().write_to_memory_function(&lvalue.ty);
                        let mut arguments = vec![address.clone()];
                        arguments.extend(prepared.expressions());
                        self.code.expression(yul::Expression::call(function, arguments));
                    }
                } else {
                    invariant!(
                        lvalue.ty.size_on_stack() == 1,
                        "Memory reference of type {} must be a single word",
                        lvalue.ty
                    );
                    invariant!(
                        value.ty().data_stored_in(DataLocation::Memory),
                        "Only memory references can be stored in memory, got {}",
                        value.ty()
                    );
                    self.code.expression(yul::Expression::call(
                        "mstore",
                        vec![address.clone(), value.expression()?],
                    ));
                }
                Ok(())
            }
            LValueKind::Tuple { components } => {
                for (index, component) in components.iter().enumerate().rev() {
                    if let Some(component) = component {
                        self.write_to_lvalue(component, &value.tuple_component(index)?)?;
                    }
                }
                Ok(())
            }
        }
    }

    pub(super) fn read_from_lvalue(&mut self, lvalue: &IRLValue) -> Result<IRVariable> {
        let result = self.new_variable(lvalue.ty.clone());
        match &lvalue.kind {
            LValueKind::Stack { variable } => self.define(&result, variable)?,
            LValueKind::Storage { slot, offset } => {
                let value = if !lvalue.ty.is_value_type() {
                    slot.clone()
                } else {
                    match offset {
                        StorageOffset::Dynamic(name) => yul::Expression::call(
                            self.utils().read_from_storage_dynamic(&lvalue.ty),
                            vec![slot.clone(), yul::Expression::ident(name.clone())],
                        ),
                        StorageOffset::Static(offset) => yul::Expression::call(
                            self.utils().read_from_storage(&lvalue.ty, *offset),
                            vec![slot.clone()],
                        ),
                    }
                };
                self.define_expression(&result, value);
            }
            LValueKind::Memory {
                address,
                byte_array_element,
            } => {
                let load = yul::Expression::call("mload", vec![address.clone()]);
                let value = if *byte_array_element {
                    yul::Expression::call(self.utils().cleanup_function(&lvalue.ty), vec![load])
                } else if lvalue.ty.is_value_type() {
                    yul::Expression::call(
                        self.utils().read_from_memory(&lvalue.ty),
                        vec![address.clone()],
                    )
                } else {
                    load
                };
                self.define_expression(&result, value);
            }
            LValueKind::Tuple { .. } => {
                return Err(CodegenError::invariant("Attempted to read from tuple lvalue."))
            }
        }
        Ok(result)
    }
}
