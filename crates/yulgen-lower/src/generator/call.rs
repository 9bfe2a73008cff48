use super::IRGeneratorForStatements;
use crate::ast::{Declaration, EventDefinition, Expression, ExpressionKind, FunctionCallKind};
use crate::config::{CALL_NEW_ACCOUNT_GAS, CALL_VALUE_TRANSFER_GAS};
use crate::errors::{CodegenError, Result};
use crate::helpers::util::expect_array;
use crate::lvalue::{IRLValue, StorageOffset};
use crate::variable::IRVariable;
use crate::{ensure_implemented, invariant};
use tracing::trace;
use yulgen_core::hash;
use yulgen_core::types::{DataLocation, FunctionKind, FunctionType, StateMutability, Type};
use yulgen_core::yul;

impl<'c> IRGeneratorForStatements<'c> {
    pub(super) fn visit_function_call(&mut self, expression: &Expression) -> Result<()> {
        let (kind, callee, arguments, names) = match &expression.kind {
            ExpressionKind::FunctionCall {
                kind,
                expression: callee,
                arguments,
                names,
            } => (*kind, callee.as_ref(), arguments, names),
            _ => return Err(CodegenError::invariant("Expected a function call")),
        };

        match kind {
            FunctionCallKind::TypeConversion => {
                invariant!(
                    arguments.len() == 1,
                    "Type conversion expects one argument, got {}",
                    arguments.len()
                );
                self.visit_expression(&arguments[0])?;
                return self.define(
                    &IRVariable::from_expression(expression),
                    &IRVariable::from_expression(&arguments[0]),
                );
            }
            FunctionCallKind::StructConstructorCall => {
                return Err(CodegenError::unimplemented("struct constructor calls"))
            }
            FunctionCallKind::FunctionCall => {}
        }

        self.visit_expression(callee)?;
        for argument in arguments {
            self.visit_expression(argument)?;
        }

        let function = match &callee.ty {
            Type::Function(function) => function.as_ref(),
            other => {
                return Err(CodegenError::invariant(format!(
                    "Call to non-function type {}",
                    other
                )))
            }
        };
        ensure_implemented!(!function.bound, "calls to bound functions");
        let arguments = reorder_arguments(function, arguments, names)?;
        trace!(kind = ?function.kind, expression = %expression.id, "lowering call");

        match function.kind {
            FunctionKind::Internal => {
                self.append_internal_call(expression, callee, function, &arguments)
            }
            FunctionKind::Event => self.append_event(callee, &arguments),
            FunctionKind::Assert | FunctionKind::Require => {
                self.append_require_or_assert(function.kind, &arguments)
            }
            FunctionKind::ObjectCreation => {
                invariant!(arguments.len() == 1, "new expects one size argument");
                let size = self.expression_as_single(arguments[0], &Type::uint256())?;
                let function = self.utils().allocate_memory_array_function(&expression.ty);
                self.define_expression(
                    &IRVariable::from_expression(expression),
                    yul::Expression::call(function, vec![size]),
                );
                Ok(())
            }
            FunctionKind::Keccak256 => {
                invariant!(arguments.len() == 1, "keccak256 expects one argument");
                let bytes = Type::bytes(DataLocation::Memory);
                let data = self
                    .convert(&IRVariable::from_expression(arguments[0]), &bytes)?
                    .expression()?;
                let utils = self.utils();
                let hashed = yul::Expression::call(
                    "keccak256",
                    vec![
                        yul::Expression::call(
                            utils.array_data_area_function(&bytes),
                            vec![data.clone()],
                        ),
                        yul::Expression::call(utils.array_length_function(&bytes), vec![data]),
                    ],
                );
                self.define_expression(&IRVariable::from_expression(expression), hashed);
                Ok(())
            }
            FunctionKind::ArrayPop => {
                let array = array_member_base(callee)?;
                let function = self.utils().storage_array_pop_function(&array.ty);
                let slot = IRVariable::from_expression(callee).part_expression("slot")?;
                self.code.expression(yul::Expression::call(function, vec![slot]));
                Ok(())
            }
            FunctionKind::ArrayPush => self.append_array_push(expression, callee, &arguments),
            FunctionKind::External
            | FunctionKind::DelegateCall
            | FunctionKind::BareCall
            | FunctionKind::BareDelegateCall
            | FunctionKind::BareStaticCall => {
                self.append_external_function_call(expression, callee, function, &arguments)
            }
            FunctionKind::BareCallCode => Err(CodegenError::invariant("callcode has been removed")),
            other => Err(CodegenError::unimplemented(format!(
                "function call kind {:?}",
                other
            ))),
        }
    }

    fn append_internal_call(
        &mut self,
        expression: &Expression,
        callee: &Expression,
        function: &FunctionType,
        arguments: &[&Expression],
    ) -> Result<()> {
        if !function.arbitrary_parameters {
            invariant!(
                arguments.len() == function.parameter_types.len(),
                "Call with {} arguments to a function with {} parameters",
                arguments.len(),
                function.parameter_types.len()
            );
        }
        let mut words = Vec::new();
        for (index, argument) in arguments.iter().enumerate() {
            if function.arbitrary_parameters {
                words.extend(IRVariable::from_expression(argument).expressions());
            } else {
                words.extend(self.expression_as_type(argument, &function.parameter_types[index])?);
            }
        }

        let target = match &callee.kind {
            ExpressionKind::Identifier {
                declaration: Declaration::Function(target),
                ..
            } => Some(target),
            _ => None,
        };
        let call = match target {
            Some(target) => {
                let name = self.context.virtual_function_name(target);
                yul::Expression::call(name, words)
            }
            None => {
                let dispatcher = self
                    .context
                    .internal_dispatch(function.parameter_types.len(), function.return_types.len());
                let mut with_identifier = vec![IRVariable::from_expression(callee)
                    .part_expression("functionIdentifier")?];
                with_identifier.extend(words);
                yul::Expression::call(dispatcher, with_identifier)
            }
        };
        self.define_expression(&IRVariable::from_expression(expression), call);
        Ok(())
    }

    fn append_event(&mut self, callee: &Expression, arguments: &[&Expression]) -> Result<()> {
        let event = event_definition(callee)?;
        invariant!(
            arguments.len() == event.parameters.len(),
            "Event {} expects {} arguments, got {}",
            event.name,
            event.parameters.len(),
            arguments.len()
        );

        let mut indexed = Vec::new();
        if !event.anonymous {
            let topic = self.new_variable(Type::uint256());
            self.define_expression(
                &topic,
                yul::Expression::hex(hash::keccak256_number(event.signature().as_bytes())),
            );
            indexed.push(topic.expression()?);
        }

        let mut non_indexed_words: Vec<yul::Expression> = Vec::new();
        let mut non_indexed_types = Vec::new();
        let mut non_indexed_parameter_types = Vec::new();
        for (argument, parameter) in arguments.iter().zip(&event.parameters) {
            let value = IRVariable::from_expression(argument);
            if parameter.indexed {
                if parameter.ty.is_value_type() {
                    indexed.push(self.convert(&value, &parameter.ty)?.expression()?);
                } else {
                    let hashed = self.new_variable(Type::uint256());
                    let function = self.utils().packed_hash_function(
                        std::slice::from_ref(&argument.ty),
                        std::slice::from_ref(&parameter.ty),
                    );
                    self.define_expression(
                        &hashed,
                        yul::Expression::call(function, value.expressions()),
                    );
                    indexed.push(hashed.expression()?);
                }
            } else {
                let mut words = value.expressions();
                words.extend(non_indexed_words);
                non_indexed_words = words;
                non_indexed_types.push(argument.ty.clone());
                non_indexed_parameter_types.push(parameter.ty.clone());
            }
        }
        invariant!(
            indexed.len() <= 4,
            "Event {} has {} indexed slots, at most 4 are allowed",
            event.name,
            indexed.len()
        );

        let encoder = self
            .abi()
            .tuple_encoder(&non_indexed_types, &non_indexed_parameter_types, false);
        let position = self.context.new_yul_variable();
        let end = self.context.new_yul_variable();
        let log = format!("log{}", indexed.len());
        let block = self.in_block(|generator| {
            generator.code.define(
                vec![position.clone()],
                yul::Expression::call("mload", vec![yul::Expression::number(64u32)]),
            );
            let mut encode_arguments = vec![yul::Expression::ident(position.clone())];
            encode_arguments.extend(non_indexed_words);
            generator
                .code
                .define(vec![end.clone()], yul::Expression::call(encoder, encode_arguments));
            let mut log_arguments = vec![
                yul::Expression::ident(position.clone()),
                yul::Expression::call(
                    "sub",
                    vec![
                        yul::Expression::ident(end.clone()),
                        yul::Expression::ident(position.clone()),
                    ],
                ),
            ];
            log_arguments.extend(indexed);
            generator.code.expression(yul::Expression::call(log, log_arguments));
            Ok(())
        })?;
        self.code.push(yul::Statement::Block(block));
        Ok(())
    }

    fn append_require_or_assert(
        &mut self,
        kind: FunctionKind,
        arguments: &[&Expression],
    ) -> Result<()> {
        invariant!(
            (1..=2).contains(&arguments.len()),
            "{:?} expects one or two arguments, got {}",
            kind,
            arguments.len()
        );
        let mut words = vec![self.expression_as_single(arguments[0], &Type::Bool)?];
        let message = arguments.get(1);
        if let Some(message) = message {
            if message.ty.size_on_stack() > 0 {
                words.extend(IRVariable::from_expression(message).expressions());
            }
        }
        let function = self
            .utils()
            .require_or_assert_function(kind == FunctionKind::Assert, message.map(|m| &m.ty));
        self.code.expression(yul::Expression::call(function, words));
        Ok(())
    }

    fn append_array_push(
        &mut self,
        expression: &Expression,
        callee: &Expression,
        arguments: &[&Expression],
    ) -> Result<()> {
        let array_expression = array_member_base(callee)?;
        let array = expect_array(&array_expression.ty, "push")?;
        let slot = IRVariable::from_expression(callee).part_expression("slot")?;

        match arguments {
            [] => {
                let function = self
                    .utils()
                    .storage_array_push_zero_function(&array_expression.ty);
                let element_slot = self.context.new_yul_variable();
                let offset = self.context.new_yul_variable();
                self.code.define(
                    vec![element_slot.clone(), offset.clone()],
                    yul::Expression::call(function, vec![slot]),
                );
                self.set_lvalue(
                    expression,
                    IRLValue::storage(
                        array.base.as_ref().clone(),
                        yul::Expression::ident(element_slot),
                        StorageOffset::Dynamic(offset),
                    ),
                )
            }
            [argument] => {
                let mut words = vec![slot];
                words.extend(self.expression_as_type(argument, &array.base)?);
                let function = self.utils().storage_array_push_function(&array_expression.ty);
                self.code.expression(yul::Expression::call(function, words));
                Ok(())
            }
            _ => Err(CodegenError::invariant("push takes at most one argument")),
        }
    }

    /// Frames an external call: encode at the free memory pointer, call, check, decode.
    fn append_external_function_call(
        &mut self,
        expression: &Expression,
        callee: &Expression,
        function: &FunctionType,
        arguments: &[&Expression],
    ) -> Result<()> {
        ensure_implemented!(
            !function.arbitrary_parameters && !function.is_bare_call(),
            "in-place argument encoding for {:?}",
            function.kind
        );
        ensure_implemented!(
            function.pads_arguments(),
            "unpadded argument encoding for {:?}",
            function.kind
        );
        invariant!(
            arguments.len() == function.parameter_types.len(),
            "External call with {} arguments to a function with {} parameters",
            arguments.len(),
            function.parameter_types.len()
        );

        let evm = self.context.evm_version();
        let is_delegate = matches!(
            function.kind,
            FunctionKind::DelegateCall | FunctionKind::BareDelegateCall
        );
        let use_static = function.kind == FunctionKind::BareStaticCall
            || (!is_delegate
                && function.state_mutability <= StateMutability::View
                && evm.has_static_call());
        let check_existence = !function.is_bare_call();
        invariant!(
            !(function.value_set && (is_delegate || use_static)),
            "Value set for a delegate or static call"
        );

        // Without returndata, dynamically encoded return values cannot be read back.
        let decoded: Vec<(usize, &Type)> = function
            .return_types
            .iter()
            .enumerate()
            .filter(|(_, ty)| evm.supports_returndata() || !ty.is_dynamically_encoded())
            .collect();
        let dynamic_return = decoded.iter().any(|(_, ty)| ty.is_dynamically_encoded());
        let return_size: u64 = if dynamic_return {
            0
        } else {
            decoded
                .iter()
                .map(|(_, ty)| ty.calldata_encoded_size())
                .sum()
        };

        let callee_value = IRVariable::from_expression(callee);
        let address = callee_value.part_expression("address")?;
        let free_memory = || yul::Expression::call("mload", vec![yul::Expression::number(64u32)]);

        if check_existence {
            let code_size = yul::Expression::call("extcodesize", vec![address.clone()]);
            self.code.push(yul::Statement::If {
                condition: yul::Expression::call("iszero", vec![code_size]),
                body: yul::Block::new(vec![yul::Statement::Expression(yul::Expression::call(
                    "revert",
                    vec![yul::Expression::number(0u32), yul::Expression::number(0u32)],
                ))]),
            });
        }
        if !evm.can_overcharge_gas_for_call() && !function.gas_set && return_size > 0 {
            let return_end = yul::Expression::call(
                "add",
                vec![free_memory(), yul::Expression::number(return_size)],
            );
            self.code.expression(yul::Expression::call(
                "mstore",
                vec![return_end, yul::Expression::number(0u32)],
            ));
        }

        let position = self.context.new_yul_variable();
        self.code.define(vec![position.clone()], free_memory());
        let shift = self.utils().shift_left_function(224);
        self.code.expression(yul::Expression::call(
            "mstore",
            vec![
                yul::Expression::ident(position.clone()),
                yul::Expression::call(
                    shift,
                    vec![callee_value.part_expression("functionIdentifier")?],
                ),
            ],
        ));

        let argument_types: Vec<Type> = arguments.iter().map(|a| a.ty.clone()).collect();
        let encoder = self
            .abi()
            .tuple_encoder(&argument_types, &function.parameter_types, false);
        let mut encode_arguments = vec![yul::Expression::call(
            "add",
            vec![yul::Expression::ident(position.clone()), yul::Expression::number(4u32)],
        )];
        for argument in arguments {
            encode_arguments.extend(IRVariable::from_expression(argument).expressions());
        }
        let end = self.context.new_yul_variable();
        self.code.define(vec![end.clone()], yul::Expression::call(encoder, encode_arguments));

        let gas = if function.gas_set {
            callee_value.part_expression("gas")?
        } else if evm.can_overcharge_gas_for_call() {
            yul::Expression::call("gas", Vec::new())
        } else {
            let mut needed = evm.call_gas() + 10;
            if function.value_set {
                needed += CALL_VALUE_TRANSFER_GAS;
            }
            if !check_existence {
                needed += CALL_NEW_ACCOUNT_GAS;
            }
            yul::Expression::call(
                "sub",
                vec![yul::Expression::call("gas", Vec::new()), yul::Expression::number(needed)],
            )
        };

        let mut call_arguments = vec![gas, address];
        let opcode = if is_delegate {
            "delegatecall"
        } else if use_static {
            "staticcall"
        } else {
            call_arguments.push(if function.value_set {
                callee_value.part_expression("value")?
            } else {
                yul::Expression::number(0u32)
            });
            "call"
        };
        call_arguments.extend([
            yul::Expression::ident(position.clone()),
            yul::Expression::call(
                "sub",
                vec![yul::Expression::ident(end), yul::Expression::ident(position.clone())],
            ),
            yul::Expression::ident(position.clone()),
            yul::Expression::number(return_size),
        ]);
        let success = self.context.new_yul_variable();
        self.code.define(vec![success.clone()], yul::Expression::call(opcode, call_arguments));

        let revert = self.utils().forwarding_revert_function();
        self.code.push(yul::Statement::If {
            condition: yul::Expression::call("iszero", vec![yul::Expression::ident(success)]),
            body: yul::Block::new(vec![yul::Statement::Expression(yul::Expression::call(
                revert,
                Vec::new(),
            ))]),
        });

        let size = if dynamic_return {
            self.code.expression(yul::Expression::call(
                "returndatacopy",
                vec![
                    yul::Expression::ident(position.clone()),
                    yul::Expression::number(0u32),
                    yul::Expression::call("returndatasize", Vec::new()),
                ],
            ));
            yul::Expression::call("returndatasize", Vec::new())
        } else {
            yul::Expression::number(return_size)
        };
        self.code.expression(yul::Expression::call(
            "mstore",
            vec![
                yul::Expression::number(64u32),
                yul::Expression::call(
                    "add",
                    vec![
                        yul::Expression::ident(position.clone()),
                        yul::Expression::call(
                            "and",
                            vec![
                                yul::Expression::call(
                                    "add",
                                    vec![size.clone(), yul::Expression::hex(0x1fu32)],
                                ),
                                yul::Expression::call("not", vec![yul::Expression::hex(0x1fu32)]),
                            ],
                        ),
                    ],
                ),
            ],
        ));

        if !decoded.is_empty() {
            let result = IRVariable::from_expression(expression);
            let targets = if function.return_types.len() == 1 {
                result.stack_slots()
            } else {
                let mut slots = Vec::new();
                for (index, _) in &decoded {
                    slots.extend(result.tuple_component(*index)?.stack_slots());
                }
                slots
            };
            let decoded_types: Vec<Type> = decoded.iter().map(|(_, ty)| (*ty).clone()).collect();
            let decoder = self.abi().tuple_decoder(&decoded_types, true);
            let end = yul::Expression::call(
                "add",
                vec![yul::Expression::ident(position.clone()), size],
            );
            let decode =
                yul::Expression::call(decoder, vec![yul::Expression::ident(position), end]);
            if targets.is_empty() {
                self.code.expression(decode);
            } else {
                self.code.define(targets, decode);
            }
        }
        Ok(())
    }
}

/// Arguments in declared parameter order. Named call-site arguments are matched by name.
fn reorder_arguments<'e>(
    function: &FunctionType,
    arguments: &'e [Expression],
    names: &[String],
) -> Result<Vec<&'e Expression>> {
    if names.is_empty() {
        return Ok(arguments.iter().collect());
    }
    invariant!(
        names.len() == arguments.len() && names.len() == function.parameter_names.len(),
        "Named call with {} names, {} arguments and {} parameters",
        names.len(),
        arguments.len(),
        function.parameter_names.len()
    );
    function
        .parameter_names
        .iter()
        .map(|parameter| {
            names
                .iter()
                .position(|name| name == parameter)
                .map(|index| &arguments[index])
                .ok_or_else(|| {
                    CodegenError::invariant(format!("No argument for parameter {}", parameter))
                })
        })
        .collect()
}

/// The array expression `a` of a callee `a.push` or `a.pop`.
fn array_member_base(callee: &Expression) -> Result<&Expression> {
    match &callee.kind {
        ExpressionKind::MemberAccess { expression, .. } => Ok(expression),
        _ => Err(CodegenError::invariant(
            "Array push and pop must be called as members",
        )),
    }
}

fn event_definition(callee: &Expression) -> Result<&EventDefinition> {
    let declaration = match &callee.kind {
        ExpressionKind::Identifier { declaration, .. } => Some(declaration),
        ExpressionKind::MemberAccess {
            referenced_declaration,
            ..
        } => referenced_declaration.as_ref(),
        _ => None,
    };
    match declaration {
        Some(Declaration::Event(event)) => Ok(event),
        _ => Err(CodegenError::invariant("Emitted expression is not an event")),
    }
}
