mod common;

use common::{context, word, Interpreter};
use num_bigint::BigUint;
use pretty_assertions::assert_eq;
use yulgen_core::types::{FunctionKind, FunctionType, Type};
use yulgen_lower::ast::{
    AssignmentOperator, BinaryOperator, DeclId, Declaration, Expression, FunctionRef, Statement,
    VariableDeclaration,
};
use yulgen_lower::{lower_function, AstBuilder, FunctionDefinition, GenerationContext};

fn function(
    return_parameters: Vec<VariableDeclaration>,
    body: Vec<Statement>,
) -> FunctionDefinition {
    FunctionDefinition {
        id: DeclId(100),
        name: "test".to_string(),
        parameters: Vec::new(),
        return_parameters,
        body,
    }
}

/// A call `name()` to an internal function returning `bool`.
fn bool_call(ast: &mut AstBuilder, function: &FunctionRef) -> Expression {
    let ty = Type::function(FunctionType::new(
        FunctionKind::Internal,
        Vec::new(),
        vec![Type::Bool],
    ));
    let callee = ast.reference(&function.name, Declaration::Function(function.clone()), ty);
    ast.call(callee, Vec::new(), Type::Bool)
}

fn short_circuit(operator: BinaryOperator, first: bool) -> (usize, usize, bool) {
    let mut ast = AstBuilder::new();
    let result = ast.variable("result", Type::Bool);
    let f = ast.function_ref("f", Vec::new());
    let g = ast.function_ref("g", Vec::new());
    let target = ast.identifier(&result);
    let left = bool_call(&mut ast, &f);
    let right = bool_call(&mut ast, &g);
    let condition = ast.binary(operator, left, right, Type::Bool);
    let assignment = ast.assign(target, condition);
    let definition = function(vec![result], vec![Statement::Expression(assignment)]);

    let mut ctx = context();
    let block = lower_function(&definition, &mut ctx).unwrap();
    let f_name = ctx.virtual_function_name(&f);
    let g_name = ctx.virtual_function_name(&g);

    let mut interpreter = Interpreter::new();
    interpreter.set("vloc_result_1", word(0));
    interpreter.stub(&f_name, move |_| vec![word(u64::from(first))]);
    interpreter.stub(&g_name, |_| vec![word(1)]);
    interpreter.run(&block);
    (
        interpreter.call_count(&f_name),
        interpreter.call_count(&g_name),
        interpreter.get("vloc_result_1") == word(1),
    )
}

#[test]
fn test_or_skips_right_side_when_left_is_true() {
    assert_eq!(short_circuit(BinaryOperator::Or, true), (1, 0, true));
    assert_eq!(short_circuit(BinaryOperator::Or, false), (1, 1, true));
}

#[test]
fn test_and_skips_right_side_when_left_is_false() {
    assert_eq!(short_circuit(BinaryOperator::And, false), (1, 0, false));
    assert_eq!(short_circuit(BinaryOperator::And, true), (1, 1, true));
}

#[test]
fn test_internal_calls_are_queued_for_generation() {
    let mut ast = AstBuilder::new();
    let f = ast.function_ref("f", Vec::new());
    let call = bool_call(&mut ast, &f);
    let definition = function(Vec::new(), vec![Statement::Expression(call)]);

    let mut ctx = context();
    lower_function(&definition, &mut ctx).unwrap();
    assert_eq!(ctx.function_generation_queue(), vec!["fun_f_1"]);
}

fn counting_loop(is_do_while: bool) -> BigUint {
    let mut ast = AstBuilder::new();
    let runs = ast.variable("runs", Type::uint256());
    let target = ast.identifier(&runs);
    let one = ast.number(1);
    let count = ast.compound_assign(AssignmentOperator::Add, target, one);
    let never = ast.bool(false);
    let definition = function(
        vec![runs],
        vec![Statement::While {
            condition: never,
            body: Box::new(Statement::Block(vec![Statement::Expression(count)])),
            is_do_while,
        }],
    );

    let mut ctx = context();
    let block = lower_function(&definition, &mut ctx).unwrap();
    let mut interpreter = Interpreter::new();
    interpreter.set("vloc_runs_1", word(0));
    interpreter.run(&block);
    interpreter.get("vloc_runs_1")
}

#[test]
fn test_do_while_runs_body_once() {
    assert_eq!(counting_loop(true), word(1));
}

#[test]
fn test_while_with_false_condition_never_runs() {
    assert_eq!(counting_loop(false), word(0));
}

#[test]
fn test_break_and_continue_in_loop() {
    // for (i = 0; ; i++) { if (i == 1) continue; if (i == 3) break; hits += 1; }
    let mut ast = AstBuilder::new();
    let hits = ast.variable("hits", Type::uint256());
    let zero = ast.number(0);
    let (i, init) = ast.local("i", Type::uint256(), Some(zero));

    let equals = |ast: &mut AstBuilder, value: i64| {
        let left = ast.identifier(&i);
        let right = ast.number(value);
        ast.binary(BinaryOperator::Equal, left, right, Type::uint256())
    };
    let skip = equals(&mut ast, 1);
    let stop = equals(&mut ast, 3);
    let target = ast.identifier(&hits);
    let one = ast.number(1);
    let count = ast.compound_assign(AssignmentOperator::Add, target, one);
    let counter = ast.identifier(&i);
    let increment = ast.unary(yulgen_lower::ast::UnaryOperator::Inc, false, counter);

    let body = Statement::Block(vec![
        Statement::If {
            condition: skip,
            true_body: Box::new(Statement::Continue),
            false_body: None,
        },
        Statement::If {
            condition: stop,
            true_body: Box::new(Statement::Break),
            false_body: None,
        },
        Statement::Expression(count),
    ]);
    let definition = function(
        vec![hits],
        vec![Statement::For {
            init: Some(Box::new(init)),
            condition: None,
            loop_expression: Some(increment),
            body: Box::new(body),
        }],
    );

    let mut ctx = context();
    let block = lower_function(&definition, &mut ctx).unwrap();
    let mut interpreter = Interpreter::new();
    interpreter.set("vloc_hits_1", word(0));
    interpreter.run(&block);
    assert_eq!(interpreter.get("vloc_hits_1"), word(2));
}

#[test]
fn test_tuple_assignment_writes_right_to_left() {
    let mut ast = AstBuilder::new();
    let first = ast.variable("first", Type::uint256());
    let second = ast.variable("second", Type::uint256());
    let first_target = ast.identifier(&first);
    let second_target = ast.identifier(&second);
    let targets = ast.tuple(vec![Some(first_target), Some(second_target)]);
    let one = ast.number(1);
    let two = ast.number(2);
    let values = ast.tuple(vec![Some(one), Some(two)]);
    let assignment = ast.assign(targets, values);
    let definition = function(Vec::new(), vec![Statement::Expression(assignment)]);

    let mut ctx = context();
    ctx.add_state_variable(first.id, 0u32, 0);
    ctx.add_state_variable(second.id, 1u32, 0);
    let block = lower_function(&definition, &mut ctx).unwrap();

    let mut interpreter = Interpreter::new();
    interpreter.run(&block);
    let writes: Vec<_> = interpreter
        .calls
        .iter()
        .filter(|(name, _)| name == "update_storage_value_offset_0_t_uint256")
        .map(|(_, arguments)| arguments.clone())
        .collect();
    assert_eq!(
        writes,
        vec![vec![word(1), word(2)], vec![word(0), word(1)]]
    );
    assert_eq!(interpreter.storage.get(&word(0)), Some(&word(1)));
    assert_eq!(interpreter.storage.get(&word(1)), Some(&word(2)));
}

#[test]
fn test_conditional_evaluates_one_branch() {
    let mut ast = AstBuilder::new();
    let flag = ast.variable("flag", Type::Bool);
    let out = ast.variable("out", Type::uint256());
    let f = ast.function_ref("f", Vec::new());
    let g = ast.function_ref("g", Vec::new());

    let ty = Type::function(FunctionType::new(
        FunctionKind::Internal,
        Vec::new(),
        vec![Type::uint256()],
    ));
    let f_callee = ast.reference("f", Declaration::Function(f.clone()), ty.clone());
    let f_call = ast.call(f_callee, Vec::new(), Type::uint256());
    let g_callee = ast.reference("g", Declaration::Function(g.clone()), ty);
    let g_call = ast.call(g_callee, Vec::new(), Type::uint256());
    let condition = ast.identifier(&flag);
    let choice = ast.conditional(condition, f_call, g_call, Type::uint256());
    let target = ast.identifier(&out);
    let assignment = ast.assign(target, choice);
    let definition = FunctionDefinition {
        id: DeclId(100),
        name: "choose".into(),
        parameters: vec![flag],
        return_parameters: vec![out],
        body: vec![Statement::Expression(assignment)],
    };

    let mut ctx = context();
    let block = lower_function(&definition, &mut ctx).unwrap();
    let mut interpreter = Interpreter::new();
    interpreter.set("vloc_flag_1", word(0));
    interpreter.set("vloc_out_2", word(0));
    interpreter.stub("fun_f_3", |_| vec![word(10)]);
    interpreter.stub("fun_g_4", |_| vec![word(20)]);
    interpreter.run(&block);
    assert_eq!(interpreter.get("vloc_out_2"), word(20));
    assert_eq!(interpreter.call_count("fun_f_3"), 0);
    assert_eq!(interpreter.call_count("fun_g_4"), 1);
}
