/*! Structured Yul.
 *
 * Lowering produces a tree, not text. Keeping blocks, control flow and calls as data lets later
 * stages inspect or rewrite the output, and leaves printing to a single isolated step.
 */

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberFormat {
    Decimal,
    Hex,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    Number { value: BigUint, format: NumberFormat },
    Bool(bool),
    String(String),
}

impl Literal {
    pub fn decimal(value: impl Into<BigUint>) -> Self {
        Literal::Number {
            value: value.into(),
            format: NumberFormat::Decimal,
        }
    }

    pub fn hex(value: impl Into<BigUint>) -> Self {
        Literal::Number {
            value: value.into(),
            format: NumberFormat::Hex,
        }
    }

    /// Decimal for values that fit in 32 bits, hex otherwise.
    pub fn number(value: impl Into<BigUint>) -> Self {
        let value = value.into();
        if value.to_u32().is_some() {
            Literal::decimal(value)
        } else {
            Literal::hex(value)
        }
    }

    pub fn number_value(&self) -> Option<&BigUint> {
        match self {
            Literal::Number { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Shortest even-length hex rendering with a `0x` prefix.
pub fn to_compact_hex_with_prefix(value: &BigUint) -> String {
    let digits = value.to_str_radix(16);
    if digits.len() % 2 == 1 {
        format!("0x0{}", digits)
    } else {
        format!("0x{}", digits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    pub function: String,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    FunctionCall(FunctionCall),
}

impl Expression {
    pub fn call(function: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCall {
            function: function.into(),
            arguments,
        })
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    pub fn idents<S: AsRef<str>>(names: &[S]) -> Vec<Expression> {
        names
            .iter()
            .map(|name| Expression::ident(name.as_ref()))
            .collect()
    }

    pub fn number(value: impl Into<BigUint>) -> Self {
        Expression::Literal(Literal::number(value))
    }

    pub fn hex(value: impl Into<BigUint>) -> Self {
        Expression::Literal(Literal::hex(value))
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

impl Block {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Case {
    /// `None` marks the default case.
    pub value: Option<Literal>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statement {
    Block(Block),
    VariableDeclaration {
        variables: Vec<String>,
        value: Option<Expression>,
    },
    Assignment {
        targets: Vec<String>,
        value: Expression,
    },
    Expression(Expression),
    If {
        condition: Expression,
        body: Block,
    },
    Switch {
        expression: Expression,
        cases: Vec<Case>,
    },
    ForLoop {
        pre: Block,
        condition: Expression,
        post: Block,
        body: Block,
    },
    FunctionDefinition {
        name: String,
        parameters: Vec<String>,
        returns: Vec<String>,
        body: Block,
    },
    Break,
    Continue,
    Leave,
}

const EVM_BUILTINS: &[&str] = &[
    "stop", "add", "sub", "mul", "div", "sdiv", "mod", "smod", "exp", "not", "lt", "gt", "slt",
    "sgt", "eq", "iszero", "and", "or", "xor", "byte", "shl", "shr", "sar", "addmod", "mulmod",
    "signextend", "keccak256", "pc", "pop", "mload", "mstore", "mstore8", "sload", "sstore",
    "msize", "gas", "address", "balance", "selfbalance", "caller", "callvalue", "calldataload",
    "calldatasize", "calldatacopy", "codesize", "codecopy", "extcodesize", "extcodecopy",
    "returndatasize", "returndatacopy", "extcodehash", "create", "create2", "call", "callcode",
    "delegatecall", "staticcall", "return", "revert", "selfdestruct", "invalid", "log0", "log1",
    "log2", "log3", "log4", "chainid", "origin", "gasprice", "blockhash", "coinbase",
    "timestamp", "number", "difficulty", "gaslimit", "datasize", "dataoffset", "datacopy",
    "setimmutable", "loadimmutable", "linkersymbol", "memoryguard",
];

/// Whether `name` is a builtin of the EVM Yul dialect.
pub fn is_evm_builtin(name: &str) -> bool {
    EVM_BUILTINS.contains(&name)
}
