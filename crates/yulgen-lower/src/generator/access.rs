use super::IRGeneratorForStatements;
use crate::ast::{Declaration, Expression};
use crate::errors::{CodegenError, Result};
use crate::helpers::util::expect_array;
use crate::lvalue::{IRLValue, StorageOffset};
use crate::variable::IRVariable;
use crate::{ensure_implemented, invariant};
use num_bigint::BigUint;
use yulgen_core::hash;
use yulgen_core::types::{DataLocation, FunctionKind, MagicKind, Type};
use yulgen_core::yul;

impl<'c> IRGeneratorForStatements<'c> {
    pub(super) fn visit_member_access(
        &mut self,
        expression: &Expression,
        base: &Expression,
        member: &str,
        referenced: Option<&Declaration>,
    ) -> Result<()> {
        let result = IRVariable::from_expression(expression);
        let base_value = IRVariable::from_expression(base);

        match &base.ty {
            Type::Contract { is_super, .. } => {
                ensure_implemented!(!is_super, "member access to super");
                let signature = match referenced {
                    Some(Declaration::Function(function)) => function.external_signature(),
                    Some(Declaration::Variable(variable)) => variable.getter_signature(),
                    other => {
                        return Err(CodegenError::invariant(format!(
                            "Contract member {} refers to {:?}",
                            member, other
                        )))
                    }
                };
                self.code
                    .define(vec![result.part("address")?], base_value.expression()?);
                self.code.define(
                    vec![result.part("functionIdentifier")?],
                    yul::Expression::hex(hash::selector(&signature)),
                );
                Ok(())
            }
            Type::Address { .. } => match member {
                "balance" => {
                    let address = self.expression_as_single(base, &Type::address())?;
                    self.define_expression(
                        &result,
                        yul::Expression::call("balance", vec![address]),
                    );
                    Ok(())
                }
                "send" | "transfer" | "call" | "callcode" | "delegatecall" | "staticcall" => {
                    let address = self.expression_as_single(base, &Type::address())?;
                    self.code.define(vec![result.part("address")?], address);
                    Ok(())
                }
                other => Err(CodegenError::invariant(format!(
                    "Invalid member access to address: {}",
                    other
                ))),
            },
            Type::Magic(kind) => self.visit_magic_member(&result, *kind, member),
            Type::Function(_) => match member {
                "selector" | "address" => Err(CodegenError::unimplemented(format!(
                    "function member {}",
                    member
                ))),
                // Applied by the call that consumes them.
                "gas" | "value" => Ok(()),
                other => Err(CodegenError::invariant(format!(
                    "Invalid member access to function: {}",
                    other
                ))),
            },
            Type::Struct(_) => Err(CodegenError::unimplemented("struct member access")),
            Type::Enum { name, members } => self.define_enum_ordinal(&result, name, members, member),
            Type::TypeType(inner) => match inner.as_ref() {
                Type::Enum { name, members } => {
                    self.define_enum_ordinal(&result, name, members, member)
                }
                other => Err(CodegenError::unimplemented(format!(
                    "member access to type {}",
                    other
                ))),
            },
            Type::Array(array) => match member {
                "length" => {
                    if let Some(length) = array.length {
                        self.define_expression(&result, yul::Expression::number(length));
                        return Ok(());
                    }
                    let length = match array.location {
                        DataLocation::CallData => base_value.part_expression("length")?,
                        DataLocation::Storage => yul::Expression::call(
                            self.utils().array_length_function(&base.ty),
                            vec![base_value.part_expression("slot")?],
                        ),
                        DataLocation::Memory => yul::Expression::call(
                            "mload",
                            vec![base_value.part_expression("mpos")?],
                        ),
                    };
                    self.define_expression(&result, length);
                    Ok(())
                }
                "push" | "pop" => {
                    invariant!(
                        array.location == DataLocation::Storage,
                        "Array {} is only available on storage arrays",
                        member
                    );
                    self.code
                        .define(vec![result.part("slot")?], base_value.part_expression("slot")?);
                    Ok(())
                }
                other => Err(CodegenError::invariant(format!(
                    "Invalid array member: {}",
                    other
                ))),
            },
            Type::FixedBytes(bytes) => {
                invariant!(member == "length", "Invalid member access to bytes{}", bytes);
                self.define_expression(&result, yul::Expression::number(u32::from(*bytes)));
                Ok(())
            }
            other => Err(CodegenError::invariant(format!(
                "Member access to unknown type {}",
                other
            ))),
        }
    }

    fn visit_magic_member(&mut self, result: &IRVariable, kind: MagicKind, member: &str) -> Result<()> {
        let builtin = |name: &str| Some(yul::Expression::call(name, Vec::new()));
        let value = match (kind, member) {
            (MagicKind::Block, "coinbase" | "timestamp" | "difficulty" | "number" | "gaslimit") => {
                builtin(member)
            }
            (MagicKind::Block, "blockhash") => {
                return Err(CodegenError::invariant("block.blockhash was removed"))
            }
            (MagicKind::Message, "sender") => builtin("caller"),
            (MagicKind::Message, "value") => builtin("callvalue"),
            (MagicKind::Message, "gas") => {
                return Err(CodegenError::invariant("msg.gas was removed"))
            }
            (MagicKind::Message, "sig") => Some(yul::Expression::call(
                "and",
                vec![
                    yul::Expression::call("calldataload", vec![yul::Expression::number(0u32)]),
                    yul::Expression::hex(BigUint::from(0xffff_ffffu32) << 224u32),
                ],
            )),
            (MagicKind::Message, "data") => {
                self.code
                    .define(vec![result.part("offset")?], yul::Expression::number(0u32));
                self.code.define(
                    vec![result.part("length")?],
                    yul::Expression::call("calldatasize", Vec::new()),
                );
                None
            }
            (MagicKind::Transaction, "origin" | "gasprice") => builtin(member),
            (MagicKind::Abi, _) => None,
            (MagicKind::MetaType, "creationCode" | "runtimeCode" | "name") => {
                return Err(CodegenError::unimplemented(format!("type(..).{}", member)))
            }
            (kind, member) => {
                return Err(CodegenError::invariant(format!(
                    "Unknown magic member {:?}.{}",
                    kind, member
                )))
            }
        };
        if let Some(value) = value {
            self.define_expression(result, value);
        }
        Ok(())
    }

    fn define_enum_ordinal(
        &mut self,
        result: &IRVariable,
        name: &str,
        members: &[String],
        member: &str,
    ) -> Result<()> {
        let ordinal = members
            .iter()
            .position(|candidate| candidate == member)
            .ok_or_else(|| {
                CodegenError::invariant(format!("Enum {} has no member {}", name, member))
            })?;
        self.define_expression(result, yul::Expression::number(ordinal as u64));
        Ok(())
    }

    pub(super) fn visit_index_access(
        &mut self,
        expression: &Expression,
        base: &Expression,
        index: Option<&Expression>,
    ) -> Result<()> {
        if let Type::TypeType(_) = base.ty {
            return Ok(());
        }
        let index = index.ok_or_else(|| {
            CodegenError::invariant(format!("Index access on {} without index", base.ty))
        })?;
        let base_value = IRVariable::from_expression(base);

        match &base.ty {
            Type::Mapping { .. } => {
                invariant!(
                    index.ty.size_on_stack() <= 1,
                    "Mapping key of type {} needs more than one word",
                    index.ty
                );
                let function = self.utils().mapping_index_access_function(&base.ty, &index.ty);
                let mut arguments = vec![base_value.part_expression("slot")?];
                arguments.extend(IRVariable::from_expression(index).expressions());
                let slot = self.context.new_yul_variable();
                self.code
                    .define(vec![slot.clone()], yul::Expression::call(function, arguments));
                self.set_lvalue(
                    expression,
                    IRLValue::storage(
                        expression.ty.clone(),
                        yul::Expression::ident(slot),
                        StorageOffset::Static(0),
                    ),
                )
            }
            Type::Array(array) => {
                let position = self.expression_as_single(index, &Type::uint256())?;
                match array.location {
                    DataLocation::Storage => {
                        let function = self.utils().storage_array_index_access_function(&base.ty);
                        let slot = self.context.new_yul_variable();
                        let offset = self.context.new_yul_variable();
                        self.code.define(
                            vec![slot.clone(), offset.clone()],
                            yul::Expression::call(
                                function,
                                vec![base_value.part_expression("slot")?, position],
                            ),
                        );
                        self.set_lvalue(
                            expression,
                            IRLValue::storage(
                                expression.ty.clone(),
                                yul::Expression::ident(slot),
                                StorageOffset::Dynamic(offset),
                            ),
                        )
                    }
                    DataLocation::Memory => {
                        let function = self.utils().memory_array_index_access_function(&base.ty);
                        let address = self.context.new_yul_variable();
                        self.code.define(
                            vec![address.clone()],
                            yul::Expression::call(
                                function,
                                vec![base_value.part_expression("mpos")?, position],
                            ),
                        );
                        self.set_lvalue(
                            expression,
                            IRLValue::memory(
                                array.base.as_ref().clone(),
                                yul::Expression::ident(address),
                                array.is_byte_array(),
                            ),
                        )
                    }
                    DataLocation::CallData => {
                        invariant!(
                            !expression.lvalue_requested,
                            "Calldata array elements cannot be assigned to"
                        );
                        self.visit_calldata_index_access(expression, base, position)
                    }
                }
            }
            Type::FixedBytes(_) => Err(CodegenError::unimplemented("fixed bytes index access")),
            other => Err(CodegenError::invariant(format!(
                "Index access to unknown type {}",
                other
            ))),
        }
    }

    fn visit_calldata_index_access(
        &mut self,
        expression: &Expression,
        base: &Expression,
        position: yul::Expression,
    ) -> Result<()> {
        let array = expect_array(&base.ty, "calldata index access")?;
        let function = self.utils().calldata_array_index_access_function(&base.ty);
        let mut arguments = IRVariable::from_expression(base).expressions();
        arguments.push(position);
        let access = yul::Expression::call(function, arguments);
        let result = IRVariable::from_expression(expression);

        if array.is_byte_array() || array.base.is_value_type() {
            let address = self.context.new_yul_variable();
            self.code.define(vec![address.clone()], access);
            let element = array.base.as_ref();
            let value = if array.is_byte_array() {
                yul::Expression::call(
                    self.utils().cleanup_function(element),
                    vec![yul::Expression::call(
                        "calldataload",
                        vec![yul::Expression::ident(address)],
                    )],
                )
            } else {
                yul::Expression::call(
                    self.utils().read_from_calldata(element),
                    vec![yul::Expression::ident(address)],
                )
            };
            self.define_expression(&result, value);
        } else {
            self.define_expression(&result, access);
        }
        Ok(())
    }

    pub(super) fn visit_identifier(
        &mut self,
        expression: &Expression,
        name: &str,
        declaration: &Declaration,
    ) -> Result<()> {
        let result = IRVariable::from_expression(expression);
        match declaration {
            Declaration::MagicVariable { .. } => {
                let value = match name {
                    "this" => Some(yul::Expression::call("address", Vec::new())),
                    "now" => Some(yul::Expression::call("timestamp", Vec::new())),
                    _ => None,
                };
                if let Some(value) = value {
                    self.define_expression(&result, value);
                }
                Ok(())
            }
            Declaration::Function(function) => {
                let id = self.context.virtual_function_id(function);
                if !result.stack_slots().is_empty() {
                    self.define_expression(&result, yul::Expression::number(id));
                }
                Ok(())
            }
            Declaration::Variable(variable) => {
                ensure_implemented!(!variable.is_constant, "constant variable {}", variable.name);
                if self.context.is_local_variable(variable.id) {
                    let local = self.context.local_variable(variable)?;
                    self.set_lvalue(expression, IRLValue::stack(local))
                } else if self.context.is_state_variable(variable.id) {
                    let (slot, offset) = self.context.storage_location_of_variable(variable.id)?;
                    self.set_lvalue(
                        expression,
                        IRLValue::storage(
                            variable.ty.clone(),
                            yul::Expression::hex(slot),
                            StorageOffset::Static(offset),
                        ),
                    )
                } else {
                    Err(CodegenError::invariant(format!(
                        "Variable {} is neither local nor state",
                        variable.name
                    )))
                }
            }
            Declaration::Contract { is_library, name } => {
                ensure_implemented!(!is_library, "library reference {}", name);
                Ok(())
            }
            Declaration::Event(_) | Declaration::Enum { .. } | Declaration::Struct { .. } => Ok(()),
            Declaration::Modifier { name } => Err(CodegenError::invariant(format!(
                "Modifier {} used as an expression",
                name
            ))),
        }
    }

    /// `f{gas: g, value: v}` carries the callee's words over and adds the options as words.
    pub(super) fn visit_function_call_options(
        &mut self,
        expression: &Expression,
        callee: &Expression,
        names: &[String],
        options: &[Expression],
    ) -> Result<()> {
        self.visit_expression(callee)?;
        for option in options {
            self.visit_expression(option)?;
        }

        let function = match &callee.ty {
            Type::Function(function) => function,
            other => {
                return Err(CodegenError::invariant(format!(
                    "Call options on non-function type {}",
                    other
                )))
            }
        };
        ensure_implemented!(!function.bound, "call options on bound functions");
        ensure_implemented!(
            matches!(
                function.kind,
                FunctionKind::External
                    | FunctionKind::DelegateCall
                    | FunctionKind::BareCall
                    | FunctionKind::BareDelegateCall
                    | FunctionKind::BareStaticCall
            ),
            "call options on {:?} functions",
            function.kind
        );
        invariant!(
            names.len() == options.len(),
            "{} option names for {} options",
            names.len(),
            options.len()
        );

        let result = IRVariable::from_expression(expression);
        let previous = IRVariable::from_expression(callee);
        for item in callee.ty.stack_items() {
            self.code.define(
                vec![result.part(&item.name)?],
                previous.part_expression(&item.name)?,
            );
        }
        for (name, option) in names.iter().zip(options) {
            match name.as_str() {
                "gas" | "value" => {
                    let value = self.expression_as_single(option, &Type::uint256())?;
                    self.code.define(vec![result.part(name)?], value);
                }
                "salt" => return Err(CodegenError::unimplemented("salt call option")),
                other => {
                    return Err(CodegenError::invariant(format!(
                        "Unknown call option {}",
                        other
                    )))
                }
            }
        }
        Ok(())
    }
}
