mod common;

use common::{context, word, Interpreter};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use yulgen_core::hash;
use yulgen_core::types::{DataLocation, FunctionKind, FunctionType, StateMutability, Type};
use yulgen_emit::{Emitter, YulEmitter};
use yulgen_lower::ast::{
    DeclId, Declaration, Expression, ExpressionKind, Statement, VariableDeclaration,
};
use yulgen_lower::{
    lower_function, AstBuilder, CodegenError, EvmVersion, FunctionDefinition, GeneratorConfig,
    HelperRegistry, IRGenerationContext,
};

fn lower_text(
    context: &mut IRGenerationContext,
    parameters: Vec<VariableDeclaration>,
    body: Vec<Statement>,
) -> Result<String, CodegenError> {
    let function = FunctionDefinition {
        id: DeclId(100),
        name: "caller".into(),
        parameters,
        return_parameters: Vec::new(),
        body,
    };
    let block = lower_function(&function, context)?;
    Ok(YulEmitter::plain().emit_to_string(&block).unwrap())
}

fn context_for(evm_version: EvmVersion) -> IRGenerationContext {
    IRGenerationContext::new(
        GeneratorConfig::for_evm(evm_version),
        Arc::new(HelperRegistry::new()),
    )
}

/// `bool ok = token.transfer(to, amount);` against a contract `token`.
fn transfer(ast: &mut AstBuilder, mutability: StateMutability) -> (Vec<VariableDeclaration>, Statement) {
    transfer_via(ast, mutability, FunctionKind::External)
}

fn transfer_via(
    ast: &mut AstBuilder,
    mutability: StateMutability,
    kind: FunctionKind,
) -> (Vec<VariableDeclaration>, Statement) {
    let token = ast.variable(
        "token",
        Type::Contract {
            name: "Token".into(),
            is_super: false,
        },
    );
    let to = ast.variable("to", Type::address());
    let amount = ast.variable("amount", Type::uint256());
    let target = ast.function_ref("transfer", vec![Type::address(), Type::uint256()]);

    let mut function = FunctionType::new(
        kind,
        vec![Type::address(), Type::uint256()],
        vec![Type::Bool],
    );
    function.state_mutability = mutability;
    let base = ast.identifier(&token);
    let callee = ast.member(
        base,
        "transfer",
        Type::function(function),
        Some(Declaration::Function(target)),
    );
    let to_argument = ast.identifier(&to);
    let amount_argument = ast.identifier(&amount);
    let call = ast.call(callee, vec![to_argument, amount_argument], Type::Bool);
    let (_, statement) = ast.local("ok", Type::Bool, Some(call));
    (vec![token, to, amount], statement)
}

#[test]
fn test_external_call_frame() {
    let mut ast = AstBuilder::new();
    let (parameters, statement) = transfer(&mut ast, StateMutability::NonPayable);
    let mut ctx = context_for(EvmVersion::Istanbul);
    let text = lower_text(&mut ctx, parameters, vec![statement]).unwrap();

    let selector = format!("0x{:08x}", hash::selector("transfer(address,uint256)"));
    assert_eq!(selector, "0xa9059cbb");
    assert!(text.contains(&format!("let expr_2_functionIdentifier := {}", selector)), "{}", text);
    assert!(text.contains("let expr_2_address := expr_1"));

    let frame = [
        "if iszero(extcodesize(expr_2_address)) { revert(0, 0) }",
        "let _4 := mload(64)",
        "mstore(_4, shift_left_224(expr_2_functionIdentifier))",
        "let _5 := abi_encode_tuple_t_address_t_uint256__to_t_address_t_uint256(add(_4, 4), expr_3, expr_4)",
        "let _6 := call(gas(), expr_2_address, 0, _4, sub(_5, _4), _4, 32)",
        "if iszero(_6) { revert_forward_1() }",
        "mstore(64, add(_4, and(add(32, 0x1f), not(0x1f))))",
        "let expr_5 := abi_decode_tuple_t_bool_fromMemory(_4, add(_4, 32))",
        "let vloc_ok_5 := expr_5",
    ];
    let mut position = 0;
    for line in frame {
        let found = text[position..]
            .find(line)
            .unwrap_or_else(|| panic!("missing or out of order: {}\n{}", line, text));
        position += found + line.len();
    }
    assert!(!text.contains("returndatacopy"));
}

#[test]
fn test_homestead_reserves_call_gas() {
    let mut ast = AstBuilder::new();
    let (parameters, statement) = transfer(&mut ast, StateMutability::NonPayable);
    let mut ctx = context_for(EvmVersion::Homestead);
    let text = lower_text(&mut ctx, parameters, vec![statement]).unwrap();

    assert!(text.contains("mstore(add(mload(64), 32), 0)"), "{}", text);
    assert!(text.contains("call(sub(gas(), 50), expr_2_address, 0, "));
}

#[test]
fn test_view_call_uses_staticcall_when_available() {
    let mut ast = AstBuilder::new();
    let (parameters, statement) = transfer(&mut ast, StateMutability::View);
    let mut ctx = context_for(EvmVersion::Istanbul);
    let text = lower_text(&mut ctx, parameters.clone(), vec![statement.clone()]).unwrap();
    assert!(text.contains("staticcall(gas(), expr_2_address, _4, "), "{}", text);

    let mut ctx = context_for(EvmVersion::SpuriousDragon);
    let text = lower_text(&mut ctx, parameters, vec![statement]).unwrap();
    assert!(!text.contains("staticcall("));
    assert!(text.contains("call(gas(), expr_2_address, 0, "));
}

#[test]
fn test_view_delegate_call_stays_delegatecall() {
    let mut ast = AstBuilder::new();
    let (parameters, statement) =
        transfer_via(&mut ast, StateMutability::View, FunctionKind::DelegateCall);
    let mut ctx = context_for(EvmVersion::Istanbul);
    let text = lower_text(&mut ctx, parameters, vec![statement]).unwrap();

    assert!(
        text.contains("let _6 := delegatecall(gas(), expr_2_address, _4, sub(_5, _4), _4, 32)"),
        "{}",
        text
    );
    assert!(!text.contains("staticcall("));
}

#[test]
fn test_pre_byzantium_skips_dynamic_return_values() {
    let mut ast = AstBuilder::new();
    let token = ast.variable(
        "token",
        Type::Contract {
            name: "Token".into(),
            is_super: false,
        },
    );
    let target = ast.function_ref("info", Vec::new());
    let returns = vec![Type::uint256(), Type::bytes(DataLocation::Memory)];
    let mut function = FunctionType::new(FunctionKind::External, Vec::new(), returns.clone());
    function.state_mutability = StateMutability::View;
    let base = ast.identifier(&token);
    let callee = ast.member(base, "info", Type::function(function), Some(Declaration::Function(target)));
    let call = ast.call(callee, Vec::new(), Type::tuple(returns));

    let mut ctx = context_for(EvmVersion::Homestead);
    let text = lower_text(&mut ctx, vec![token], vec![Statement::Expression(call)]).unwrap();
    assert!(text.contains("mstore(add(mload(64), 32), 0)"), "{}", text);
    assert!(text.contains("call(sub(gas(), 50), expr_2_address, 0, _2, sub(_3, _2), _2, 32)"));
    assert!(text.contains(
        "let expr_3_component_1 := abi_decode_tuple_t_uint256_fromMemory(_2, add(_2, 32))"
    ));
    assert!(!text.contains("expr_3_component_2"));
    assert!(!text.contains("returndatacopy"));
    assert!(!text.contains("t_bytes_memory_ptr"));
}

#[test]
fn test_dynamic_return_copies_returndata() {
    let mut ast = AstBuilder::new();
    let token = ast.variable(
        "token",
        Type::Contract {
            name: "Token".into(),
            is_super: false,
        },
    );
    let target = ast.function_ref("name", Vec::new());
    let mut function = FunctionType::new(
        FunctionKind::External,
        Vec::new(),
        vec![Type::string(DataLocation::Memory)],
    );
    function.state_mutability = StateMutability::View;
    let base = ast.identifier(&token);
    let callee = ast.member(base, "name", Type::function(function), Some(Declaration::Function(target)));
    let call = ast.call(callee, Vec::new(), Type::string(DataLocation::Memory));

    let mut ctx = context_for(EvmVersion::Istanbul);
    let text = lower_text(&mut ctx, vec![token], vec![Statement::Expression(call)]).unwrap();
    assert!(text.contains("staticcall(gas(), expr_2_address, _2, sub(_3, _2), _2, 0)"), "{}", text);
    assert!(text.contains("returndatacopy(_2, 0, returndatasize())"));
    assert!(text.contains("abi_decode_tuple_t_string_memory_ptr_fromMemory(_2, add(_2, returndatasize()))"));
}

#[test]
fn test_call_options_override_gas() {
    let mut ast = AstBuilder::new();
    let token = ast.variable(
        "token",
        Type::Contract {
            name: "Token".into(),
            is_super: false,
        },
    );
    let limit = ast.variable("limit", Type::uint256());
    let target = ast.function_ref("ping", Vec::new());
    let function = FunctionType::new(FunctionKind::External, Vec::new(), Vec::new());
    let mut with_gas = function.clone();
    with_gas.gas_set = true;

    let base = ast.identifier(&token);
    let member = ast.member(base, "ping", Type::function(function), Some(Declaration::Function(target)));
    let gas = ast.identifier(&limit);
    let options = ast.expression(
        Type::function(with_gas),
        ExpressionKind::FunctionCallOptions {
            expression: Box::new(member),
            names: vec!["gas".into()],
            options: vec![gas],
        },
    );
    let call = ast.call(options, Vec::new(), Type::empty_tuple());

    let mut ctx = context_for(EvmVersion::Istanbul);
    let text = lower_text(&mut ctx, vec![token, limit], vec![Statement::Expression(call)]).unwrap();
    assert!(text.contains("let expr_4_address := expr_2_address"), "{}", text);
    assert!(text.contains("let expr_4_gas := expr_3"));
    assert!(text.contains("call(expr_4_gas, expr_4_address, 0, "));
    assert!(!text.contains("abi_decode_tuple"));
}

#[test]
fn test_bare_calls_fail_fast() {
    let mut ast = AstBuilder::new();
    let who = ast.variable("who", Type::address());
    let base = ast.identifier(&who);
    let mut function = FunctionType::new(
        FunctionKind::BareCall,
        vec![Type::bytes(DataLocation::Memory)],
        vec![Type::Bool, Type::bytes(DataLocation::Memory)],
    );
    function.arbitrary_parameters = true;
    let callee = ast.member(base, "call", Type::function(function), None);
    let payload = ast.variable("payload", Type::bytes(DataLocation::Memory));
    let argument = ast.identifier(&payload);
    let call = ast.call(
        callee,
        vec![argument],
        Type::tuple(vec![Type::Bool, Type::bytes(DataLocation::Memory)]),
    );

    let mut ctx = context();
    let err = lower_text(&mut ctx, vec![who, payload], vec![Statement::Expression(call)]).unwrap_err();
    assert!(err.is_unimplemented(), "{}", err);
}

fn transfer_event(ast: &mut AstBuilder, extra_indexed: usize) -> yulgen_lower::ast::EventDefinition {
    let mut parameters = vec![
        ("from", Type::address(), true),
        ("to", Type::address(), true),
        ("value", Type::uint256(), false),
    ];
    for _ in 0..extra_indexed {
        parameters.push(("extra", Type::uint256(), true));
    }
    ast.event("Transfer", &parameters)
}

fn emit(ast: &mut AstBuilder, event: &yulgen_lower::ast::EventDefinition, arguments: Vec<Expression>) -> Statement {
    let types: Vec<Type> = event.parameters.iter().map(|p| p.ty.clone()).collect();
    let callee = ast.reference(
        &event.name,
        Declaration::Event(event.clone()),
        Type::function(FunctionType::new(FunctionKind::Event, types, Vec::new())),
    );
    Statement::Emit(ast.call(callee, arguments, Type::empty_tuple()))
}

#[test]
fn test_event_topics_and_data() {
    let mut ast = AstBuilder::new();
    let from = ast.variable("from", Type::address());
    let to = ast.variable("to", Type::address());
    let value = ast.variable("value", Type::uint256());
    let event = transfer_event(&mut ast, 0);
    let arguments = vec![ast.identifier(&from), ast.identifier(&to), ast.identifier(&value)];
    let statement = emit(&mut ast, &event, arguments);

    let mut ctx = context();
    let text = lower_text(&mut ctx, vec![from, to, value], vec![statement]).unwrap();
    assert!(text.contains(
        "let _4 := 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
    ), "{}", text);
    assert!(text.contains("let _6 := abi_encode_tuple_t_uint256__to_t_uint256(_5, expr_3)"));
    assert!(text.contains("log3(_5, sub(_6, _5), _4, expr_1, expr_2)"));
}

#[test]
fn test_non_indexed_event_words_are_passed_last_first() {
    let mut ast = AstBuilder::new();
    let amount = ast.variable("amount", Type::uint256());
    let flag = ast.variable("flag", Type::Bool);
    let event = ast.event(
        "Pair",
        &[("amount", Type::uint256(), false), ("flag", Type::Bool, false)],
    );
    let arguments = vec![ast.identifier(&amount), ast.identifier(&flag)];
    let statement = emit(&mut ast, &event, arguments);

    let mut ctx = context();
    let text = lower_text(&mut ctx, vec![amount, flag], vec![statement]).unwrap();
    assert!(text.contains(
        "let _5 := abi_encode_tuple_t_uint256_t_bool__to_t_uint256_t_bool(_4, expr_2, expr_1)"
    ), "{}", text);
    assert!(text.contains("log1(_4, sub(_5, _4), _3)"));
}

#[test]
fn test_anonymous_event_has_no_signature_topic() {
    let mut ast = AstBuilder::new();
    let from = ast.variable("from", Type::address());
    let to = ast.variable("to", Type::address());
    let value = ast.variable("value", Type::uint256());
    let mut event = transfer_event(&mut ast, 0);
    event.anonymous = true;
    let arguments = vec![ast.identifier(&from), ast.identifier(&to), ast.identifier(&value)];
    let statement = emit(&mut ast, &event, arguments);

    let mut ctx = context();
    let text = lower_text(&mut ctx, vec![from, to, value], vec![statement]).unwrap();
    assert!(text.contains("log2(_4, sub(_5, _4), expr_1, expr_2)"), "{}", text);
    assert!(!text.contains("0xddf252ad"));
}

#[test]
fn test_event_with_too_many_topics_is_rejected() {
    let mut ast = AstBuilder::new();
    let event = transfer_event(&mut ast, 2);
    let mut parameters = Vec::new();
    let mut arguments = Vec::new();
    for parameter in &event.parameters {
        let local = ast.variable(&parameter.name, parameter.ty.clone());
        arguments.push(ast.identifier(&local));
        parameters.push(local);
    }
    let statement = emit(&mut ast, &event, arguments);

    let mut ctx = context();
    let err = lower_text(&mut ctx, parameters, vec![statement]).unwrap_err();
    assert!(matches!(err, CodegenError::InvariantViolation { .. }), "{}", err);
}

fn require(ast: &mut AstBuilder, condition: Expression, message: Option<Expression>) -> Statement {
    let mut parameter_types = vec![Type::Bool];
    let mut arguments = vec![condition];
    if let Some(message) = message {
        parameter_types.push(message.ty.clone());
        arguments.push(message);
    }
    let ty = Type::function(FunctionType::new(FunctionKind::Require, parameter_types, Vec::new()));
    let callee = ast.reference(
        "require",
        Declaration::MagicVariable {
            name: "require".into(),
            ty: ty.clone(),
        },
        ty,
    );
    Statement::Expression(ast.call(callee, arguments, Type::empty_tuple()))
}

#[test]
fn test_require_names_helper_after_message_type() {
    let mut ast = AstBuilder::new();
    let ok = ast.variable("ok", Type::Bool);
    let condition = ast.identifier(&ok);
    let message = ast.string_literal("insufficient balance");
    let statement = require(&mut ast, condition, Some(message));

    let mut ctx = context();
    let text = lower_text(&mut ctx, vec![ok], vec![statement]).unwrap();
    let expected = format!(
        "require_helper_t_stringliteral_{}(expr_1)\n",
        hash::to_hex(&hash::keccak256(b"insufficient balance"))
    );
    assert!(text.ends_with(&expected), "{}", text);

    let mut ast = AstBuilder::new();
    let ok = ast.variable("ok", Type::Bool);
    let condition = ast.identifier(&ok);
    let statement = require(&mut ast, condition, None);
    let mut ctx = context();
    let text = lower_text(&mut ctx, vec![ok], vec![statement]).unwrap();
    assert!(text.ends_with("require_helper(expr_1)\n"), "{}", text);
}

fn storage_array(ast: &mut AstBuilder) -> (VariableDeclaration, IRGenerationContext) {
    let items = ast.variable(
        "items",
        Type::array(Type::uint256(), None, DataLocation::Storage),
    );
    let mut ctx = context();
    ctx.add_state_variable(items.id, 2u32, 0);
    (items, ctx)
}

fn array_member(ast: &mut AstBuilder, items: &VariableDeclaration, member: &str, kind: FunctionKind, parameters: Vec<Type>) -> Expression {
    let base = ast.identifier(items);
    ast.member(
        base,
        member,
        Type::function(FunctionType::new(kind, parameters, Vec::new())),
        None,
    )
}

#[test]
fn test_array_push_and_pop() {
    let mut ast = AstBuilder::new();
    let (items, mut ctx) = storage_array(&mut ast);
    let push = array_member(&mut ast, &items, "push", FunctionKind::ArrayPush, vec![Type::uint256()]);
    let five = ast.number(5);
    let push_call = ast.call(push, vec![five], Type::empty_tuple());
    let pop = array_member(&mut ast, &items, "pop", FunctionKind::ArrayPop, Vec::new());
    let pop_call = ast.call(pop, Vec::new(), Type::empty_tuple());

    let text = lower_text(
        &mut ctx,
        Vec::new(),
        vec![Statement::Expression(push_call), Statement::Expression(pop_call)],
    )
    .unwrap();
    assert!(text.contains(
        "array_push_t_array$_t_uint256_$dyn_storage(expr_2_slot, convert_t_rational_5_by_1_to_t_uint256(expr_3))"
    ), "{}", text);
    assert!(text.ends_with("array_pop_t_array$_t_uint256_$dyn_storage(expr_6_slot)\n"));
}

#[test]
fn test_push_without_argument_yields_assignable_slot() {
    let mut ast = AstBuilder::new();
    let (items, mut ctx) = storage_array(&mut ast);
    let push = array_member(&mut ast, &items, "push", FunctionKind::ArrayPush, Vec::new());
    let push_call = ast.call(push, Vec::new(), Type::uint256());
    let seven = ast.number(7);
    let assignment = ast.assign(push_call, seven);

    let text = lower_text(&mut ctx, Vec::new(), vec![Statement::Expression(assignment)]).unwrap();
    assert!(text.contains(
        "let _3, _4 := array_push_zero_t_array$_t_uint256_$dyn_storage(expr_2_slot)"
    ), "{}", text);
    assert!(text.contains("update_storage_value_t_uint256(_3, _4, _1)"));
}

#[test]
fn test_named_arguments_follow_parameter_order() {
    let mut ast = AstBuilder::new();
    let target = ast.function_ref("set", vec![Type::uint256(), Type::uint256()]);
    let mut function = FunctionType::new(
        FunctionKind::Internal,
        vec![Type::uint256(), Type::uint256()],
        Vec::new(),
    );
    function.parameter_names = vec!["key".into(), "value".into()];
    let callee = ast.reference("set", Declaration::Function(target), Type::function(function));
    let value = ast.number(20);
    let key = ast.number(10);
    let call = ast.named_call(
        callee,
        vec![value, key],
        vec!["value".into(), "key".into()],
        Type::empty_tuple(),
    );

    let mut ctx = context();
    let function = FunctionDefinition {
        id: DeclId(100),
        name: "caller".into(),
        parameters: Vec::new(),
        return_parameters: Vec::new(),
        body: vec![Statement::Expression(call)],
    };
    let block = lower_function(&function, &mut ctx).unwrap();
    let mut interpreter = Interpreter::new();
    interpreter.stub("fun_set_1", |_| Vec::new());
    interpreter.run(&block);
    assert_eq!(
        interpreter.calls.last(),
        Some(&("fun_set_1".to_string(), vec![word(10), word(20)]))
    );
}

#[test]
fn test_function_pointer_call_goes_through_dispatcher() {
    let mut ast = AstBuilder::new();
    let pointer = ast.variable(
        "pointer",
        Type::function(FunctionType::new(
            FunctionKind::Internal,
            Vec::new(),
            vec![Type::uint256()],
        )),
    );
    let callee = ast.identifier(&pointer);
    let call = ast.call(callee, Vec::new(), Type::uint256());

    let mut ctx = context();
    let text = lower_text(&mut ctx, vec![pointer], vec![Statement::Expression(call)]).unwrap();
    assert!(text.ends_with(
        "let expr_2 := dispatch_internal_in_0_out_1(expr_1_functionIdentifier)\n"
    ), "{}", text);
}

#[test]
fn test_keccak256_hashes_memory_bytes() {
    let mut ast = AstBuilder::new();
    let data = ast.variable("data", Type::bytes(DataLocation::Memory));
    let ty = Type::function(FunctionType::new(
        FunctionKind::Keccak256,
        vec![Type::bytes(DataLocation::Memory)],
        vec![Type::FixedBytes(32)],
    ));
    let callee = ast.reference(
        "keccak256",
        Declaration::MagicVariable {
            name: "keccak256".into(),
            ty: ty.clone(),
        },
        ty,
    );
    let argument = ast.identifier(&data);
    let call = ast.call(callee, vec![argument], Type::FixedBytes(32));

    let mut ctx = context();
    let text = lower_text(&mut ctx, vec![data], vec![Statement::Expression(call)]).unwrap();
    assert!(text.ends_with(
        "let expr_3 := keccak256(array_dataslot_t_bytes_memory_ptr(expr_2_mpos), array_length_t_bytes_memory_ptr(expr_2_mpos))\n"
    ), "{}", text);
}
