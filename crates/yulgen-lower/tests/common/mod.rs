//! A small Yul interpreter over the structured IR, for checking what lowered code does.
//!
//! Words are `BigUint` reduced modulo 2^256. EVM builtins needed by the tests are implemented
//! directly; generated helper functions are resolved by name prefix or by stubs installed with
//! [`Interpreter::stub`]. Every non-builtin call is recorded in [`Interpreter::calls`].

#![allow(dead_code)]

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use std::collections::HashMap;
use yulgen_core::yul::{Block, Expression, Literal, Statement};
use yulgen_lower::{GenerationContext, IRGenerationContext};

type Stub = Box<dyn Fn(&[BigUint]) -> Vec<BigUint>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
    Leave,
}

pub struct Interpreter {
    scopes: Vec<HashMap<String, BigUint>>,
    pub storage: HashMap<BigUint, BigUint>,
    pub memory: HashMap<BigUint, BigUint>,
    pub calls: Vec<(String, Vec<BigUint>)>,
    stubs: HashMap<String, Stub>,
    steps: usize,
}

pub fn word(value: u64) -> BigUint {
    BigUint::from(value)
}

fn modulus() -> BigUint {
    BigUint::one() << 256u32
}

fn truth(value: bool) -> BigUint {
    if value {
        BigUint::one()
    } else {
        BigUint::zero()
    }
}

fn is_negative(value: &BigUint) -> bool {
    value.bit(255)
}

fn signed_less(a: &BigUint, b: &BigUint) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        _ => a < b,
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
            storage: HashMap::new(),
            memory: HashMap::new(),
            calls: Vec::new(),
            stubs: HashMap::new(),
            steps: 0,
        }
    }

    /// Pre-binds a variable in the outermost scope, e.g. a function parameter.
    pub fn set(&mut self, name: &str, value: BigUint) {
        self.scopes[0].insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> BigUint {
        self.lookup(name)
            .unwrap_or_else(|| panic!("unknown variable {}", name))
    }

    pub fn stub<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[BigUint]) -> Vec<BigUint> + 'static,
    {
        self.stubs.insert(name.to_string(), Box::new(function));
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls.iter().filter(|(called, _)| called == name).count()
    }

    /// Runs a function body in the outermost scope so its variables stay inspectable.
    pub fn run(&mut self, block: &Block) {
        for statement in &block.statements {
            if self.execute(statement) != Flow::Normal {
                break;
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<BigUint> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    fn assign(&mut self, name: &str, value: BigUint) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        panic!("assignment to undeclared variable {}", name);
    }

    fn declare(&mut self, name: &str, value: BigUint) {
        self.scopes
            .last_mut()
            .expect("scope")
            .insert(name.to_string(), value);
    }

    fn block(&mut self, block: &Block) -> Flow {
        self.scopes.push(HashMap::new());
        let mut flow = Flow::Normal;
        for statement in &block.statements {
            flow = self.execute(statement);
            if flow != Flow::Normal {
                break;
            }
        }
        self.scopes.pop();
        flow
    }

    fn execute(&mut self, statement: &Statement) -> Flow {
        self.steps += 1;
        assert!(self.steps < 100_000, "interpreter step limit exceeded");
        match statement {
            Statement::Block(block) => self.block(block),
            Statement::VariableDeclaration { variables, value } => {
                let values = match value {
                    Some(value) => self.evaluate(value),
                    None => vec![BigUint::zero(); variables.len()],
                };
                assert_eq!(values.len(), variables.len(), "arity mismatch in let");
                for (name, value) in variables.iter().zip(values) {
                    self.declare(name, value);
                }
                Flow::Normal
            }
            Statement::Assignment { targets, value } => {
                let values = self.evaluate(value);
                assert_eq!(values.len(), targets.len(), "arity mismatch in assignment");
                for (name, value) in targets.iter().zip(values) {
                    self.assign(name, value);
                }
                Flow::Normal
            }
            Statement::Expression(expression) => {
                let values = self.evaluate(expression);
                assert!(values.is_empty(), "expression statement left values behind");
                Flow::Normal
            }
            Statement::If { condition, body } => {
                if self.single(condition).is_zero() {
                    Flow::Normal
                } else {
                    self.block(body)
                }
            }
            Statement::Switch { expression, cases } => {
                let value = self.single(expression);
                let chosen = cases
                    .iter()
                    .find(|case| match &case.value {
                        Some(Literal::Number { value: case_value, .. }) => *case_value == value,
                        Some(other) => panic!("unsupported case literal {:?}", other),
                        None => false,
                    })
                    .or_else(|| cases.iter().find(|case| case.value.is_none()));
                match chosen {
                    Some(case) => self.block(&case.body),
                    None => Flow::Normal,
                }
            }
            Statement::ForLoop {
                pre,
                condition,
                post,
                body,
            } => {
                self.scopes.push(HashMap::new());
                let mut flow = Flow::Normal;
                for statement in &pre.statements {
                    self.execute(statement);
                }
                loop {
                    if self.single(condition).is_zero() {
                        break;
                    }
                    match self.block(body) {
                        Flow::Break => break,
                        Flow::Leave => {
                            flow = Flow::Leave;
                            break;
                        }
                        Flow::Normal | Flow::Continue => {}
                    }
                    self.block(post);
                }
                self.scopes.pop();
                flow
            }
            Statement::FunctionDefinition { name, .. } => {
                panic!("nested function definition {} is not supported", name)
            }
            Statement::Break => Flow::Break,
            Statement::Continue => Flow::Continue,
            Statement::Leave => Flow::Leave,
        }
    }

    fn single(&mut self, expression: &Expression) -> BigUint {
        let mut values = self.evaluate(expression);
        assert_eq!(values.len(), 1, "expected a single value from {:?}", expression);
        values.remove(0)
    }

    fn evaluate(&mut self, expression: &Expression) -> Vec<BigUint> {
        match expression {
            Expression::Literal(Literal::Number { value, .. }) => vec![value.clone()],
            Expression::Literal(Literal::Bool(value)) => vec![truth(*value)],
            Expression::Literal(Literal::String(_)) => panic!("string literals are not supported"),
            Expression::Identifier(name) => vec![self.get(name)],
            Expression::FunctionCall(call) => {
                let arguments: Vec<BigUint> = call
                    .arguments
                    .iter()
                    .map(|argument| self.single(argument))
                    .collect();
                self.call(&call.function, &arguments)
            }
        }
    }

    fn call(&mut self, function: &str, arguments: &[BigUint]) -> Vec<BigUint> {
        if let Some(value) = self.builtin(function, arguments) {
            return value;
        }
        self.calls.push((function.to_string(), arguments.to_vec()));
        if let Some(stub) = self.stubs.get(function) {
            return stub(arguments);
        }
        self.helper(function, arguments)
    }

    fn builtin(&mut self, function: &str, a: &[BigUint]) -> Option<Vec<BigUint>> {
        let m = modulus();
        let value = match function {
            "add" => (&a[0] + &a[1]) % &m,
            "sub" => (&a[0] + &m - &a[1]) % &m,
            "mul" => (&a[0] * &a[1]) % &m,
            "div" => {
                if a[1].is_zero() {
                    BigUint::zero()
                } else {
                    &a[0] / &a[1]
                }
            }
            "mod" => {
                if a[1].is_zero() {
                    BigUint::zero()
                } else {
                    &a[0] % &a[1]
                }
            }
            "lt" => truth(a[0] < a[1]),
            "gt" => truth(a[0] > a[1]),
            "slt" => truth(signed_less(&a[0], &a[1])),
            "sgt" => truth(signed_less(&a[1], &a[0])),
            "eq" => truth(a[0] == a[1]),
            "iszero" => truth(a[0].is_zero()),
            "and" => &a[0] & &a[1],
            "or" => &a[0] | &a[1],
            "xor" => &a[0] ^ &a[1],
            "not" => &m - BigUint::one() - &a[0],
            "shl" => (&a[1] << a[0].to_usize().unwrap_or(256)) % &m,
            "shr" => &a[1] >> a[0].to_usize().unwrap_or(256),
            "sload" => self.storage.get(&a[0]).cloned().unwrap_or_default(),
            "sstore" => {
                self.storage.insert(a[0].clone(), a[1].clone());
                return Some(Vec::new());
            }
            "mload" => self.memory.get(&a[0]).cloned().unwrap_or_default(),
            "mstore" => {
                self.memory.insert(a[0].clone(), a[1].clone());
                return Some(Vec::new());
            }
            "address" => word(0xc0de),
            "caller" => word(0xca11),
            "callvalue" => BigUint::zero(),
            "timestamp" => word(1_700_000_000),
            "number" => word(42),
            "calldatasize" => word(4),
            _ => return None,
        };
        Some(vec![value])
    }

    /// Behavior of generated helpers, keyed by name prefix.
    fn helper(&mut self, function: &str, a: &[BigUint]) -> Vec<BigUint> {
        let m = modulus();
        let prefixes: &[&str] = &[
            "convert_",
            "cleanup_",
            "checked_add_",
            "checked_sub_",
            "checked_mul_",
            "checked_div_",
            "checked_mod_",
            "increment_",
            "decrement_",
            "read_from_storage_offset_0_",
            "update_storage_value_offset_0_",
            "zero_value_for_",
        ];
        let prefix = prefixes
            .iter()
            .find(|prefix| function.starts_with(**prefix))
            .unwrap_or_else(|| panic!("no behavior for helper {}", function));
        let value = match *prefix {
            // Multi-word values convert word by word.
            "convert_" | "cleanup_" => return a.to_vec(),
            "checked_add_" => {
                let sum = &a[0] + &a[1];
                assert!(sum < m, "checked addition overflowed");
                sum
            }
            "checked_sub_" => {
                assert!(a[0] >= a[1], "checked subtraction underflowed");
                &a[0] - &a[1]
            }
            "checked_mul_" => {
                let product = &a[0] * &a[1];
                assert!(product < m, "checked multiplication overflowed");
                product
            }
            "checked_div_" => {
                assert!(!a[1].is_zero(), "division by zero");
                &a[0] / &a[1]
            }
            "checked_mod_" => {
                assert!(!a[1].is_zero(), "modulo by zero");
                &a[0] % &a[1]
            }
            "increment_" => &a[0] + BigUint::one(),
            "decrement_" => &a[0] - BigUint::one(),
            "read_from_storage_offset_0_" => self.storage.get(&a[0]).cloned().unwrap_or_default(),
            "update_storage_value_offset_0_" => {
                self.storage.insert(a[0].clone(), a[1].clone());
                return Vec::new();
            }
            "zero_value_for_" => BigUint::zero(),
            _ => unreachable!(),
        };
        vec![value]
    }
}

/// A context with default configuration and its own helper registry.
pub fn context() -> IRGenerationContext {
    IRGenerationContext::with_defaults()
}

/// Names of all helpers requested through `context`.
pub fn helper_names(context: &IRGenerationContext) -> Vec<String> {
    context.helpers().names()
}
