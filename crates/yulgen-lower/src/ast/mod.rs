/*! Typed syntax tree handed over by the front-end.
 *
 * By the time code generation runs, names are resolved and every expression carries its type.
 * This module models exactly that annotated shape: expressions know their type, whether they are
 * assigned to, and which declaration an identifier refers to. The generator only reads it.
 */

pub mod build;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use yulgen_core::types::Type;
use yulgen_core::yul;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub u32);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub id: DeclId,
    pub name: String,
    pub ty: Type,
    #[serde(default)]
    pub is_constant: bool,
    #[serde(default)]
    pub indexed: bool,
}

impl VariableDeclaration {
    /// Signature of the public getter for a state variable.
    pub fn getter_signature(&self) -> String {
        signature(&self.name, &self.ty.getter_parameter_types())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRef {
    pub id: DeclId,
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<Type>,
}

impl FunctionRef {
    pub fn external_signature(&self) -> String {
        signature(&self.name, &self.parameter_types)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: DeclId,
    pub name: String,
    pub parameters: Vec<VariableDeclaration>,
    #[serde(default)]
    pub anonymous: bool,
}

impl EventDefinition {
    pub fn signature(&self) -> String {
        let types: Vec<Type> = self.parameters.iter().map(|p| p.ty.clone()).collect();
        signature(&self.name, &types)
    }
}

fn signature(name: &str, types: &[Type]) -> String {
    let names: Vec<String> = types.iter().map(Type::canonical_name).collect();
    format!("{}({})", name, names.join(","))
}

/// What an identifier or member access resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Declaration {
    Variable(VariableDeclaration),
    Function(FunctionRef),
    MagicVariable { name: String, ty: Type },
    Contract { name: String, is_library: bool },
    Event(EventDefinition),
    Enum { name: String },
    Struct { name: String },
    Modifier { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentOperator {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitOr,
    BitAnd,
    BitXor,
    Shl,
    Sar,
}

impl AssignmentOperator {
    /// The arithmetic part of a compound assignment such as `+=`.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::Add => Some(BinaryOperator::Add),
            AssignmentOperator::Sub => Some(BinaryOperator::Sub),
            AssignmentOperator::Mul => Some(BinaryOperator::Mul),
            AssignmentOperator::Div => Some(BinaryOperator::Div),
            AssignmentOperator::Mod => Some(BinaryOperator::Mod),
            AssignmentOperator::BitOr => Some(BinaryOperator::BitOr),
            AssignmentOperator::BitAnd => Some(BinaryOperator::BitAnd),
            AssignmentOperator::BitXor => Some(BinaryOperator::BitXor),
            AssignmentOperator::Shl => Some(BinaryOperator::Shl),
            AssignmentOperator::Sar => Some(BinaryOperator::Sar),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Sar,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equal
                | BinaryOperator::NotEqual
                | BinaryOperator::LessThan
                | BinaryOperator::GreaterThan
                | BinaryOperator::LessThanOrEqual
                | BinaryOperator::GreaterThanOrEqual
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Sar => ">>",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Exp => "**",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThanOrEqual => ">=",
        };
        write!(f, "{}", token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    BitNot,
    Inc,
    Dec,
    Add,
    Sub,
    Delete,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            UnaryOperator::Not => "!",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Inc => "++",
            UnaryOperator::Dec => "--",
            UnaryOperator::Add => "+",
            UnaryOperator::Sub => "-",
            UnaryOperator::Delete => "delete",
        };
        write!(f, "{}", token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionCallKind {
    FunctionCall,
    TypeConversion,
    StructConstructorCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub id: NodeId,
    pub ty: Type,
    #[serde(default)]
    pub lvalue_requested: bool,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpressionKind {
    Conditional {
        condition: Box<Expression>,
        true_expression: Box<Expression>,
        false_expression: Box<Expression>,
    },
    Assignment {
        operator: AssignmentOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Tuple {
        components: Vec<Option<Expression>>,
        #[serde(default)]
        is_inline_array: bool,
    },
    UnaryOperation {
        operator: UnaryOperator,
        prefix: bool,
        sub_expression: Box<Expression>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        common_type: Type,
    },
    FunctionCall {
        kind: FunctionCallKind,
        expression: Box<Expression>,
        arguments: Vec<Expression>,
        #[serde(default)]
        names: Vec<String>,
    },
    FunctionCallOptions {
        expression: Box<Expression>,
        names: Vec<String>,
        options: Vec<Expression>,
    },
    New {
        type_name: String,
    },
    MemberAccess {
        expression: Box<Expression>,
        member: String,
        #[serde(default)]
        referenced_declaration: Option<Declaration>,
    },
    IndexAccess {
        base: Box<Expression>,
        index: Option<Box<Expression>>,
    },
    IndexRangeAccess {
        base: Box<Expression>,
        start: Option<Box<Expression>>,
        end: Option<Box<Expression>>,
    },
    Identifier {
        name: String,
        declaration: Declaration,
    },
    ElementaryTypeName {
        type_name: String,
    },
    Literal {
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub declaration: Declaration,
    #[serde(default)]
    pub is_slot: bool,
    #[serde(default)]
    pub is_offset: bool,
}

/// An inline assembly block. References to outer declarations are keyed by the identifier as
/// it appears inside the block, e.g. `x` or `x_slot`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineAssembly {
    pub operations: yul::Block,
    #[serde(default)]
    pub external_references: IndexMap<String, ExternalReference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    Block(Vec<Statement>),
    VariableDeclaration {
        declarations: Vec<Option<VariableDeclaration>>,
        initial_value: Option<Expression>,
    },
    Expression(Expression),
    If {
        condition: Expression,
        true_body: Box<Statement>,
        false_body: Option<Box<Statement>>,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        loop_expression: Option<Expression>,
        body: Box<Statement>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
        #[serde(default)]
        is_do_while: bool,
    },
    Continue,
    Break,
    Return {
        expression: Option<Expression>,
        return_parameters: Vec<VariableDeclaration>,
    },
    Emit(Expression),
    InlineAssembly(InlineAssembly),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub id: DeclId,
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<VariableDeclaration>,
    #[serde(default)]
    pub return_parameters: Vec<VariableDeclaration>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateVariable {
    pub declaration: VariableDeclaration,
    #[serde(default)]
    pub value: Option<Expression>,
}
