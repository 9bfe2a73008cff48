//! Fluent construction of typed trees, for front-end adapters and tests.

use super::{
    AssignmentOperator, BinaryOperator, DeclId, Declaration, EventDefinition, Expression,
    ExpressionKind, FunctionCallKind, FunctionRef, NodeId, Statement, UnaryOperator,
    VariableDeclaration,
};
use yulgen_core::types::Type;

/// Hands out node and declaration ids, both starting at 1, and builds annotated nodes.
#[derive(Debug)]
pub struct AstBuilder {
    next_node: u32,
    next_declaration: u32,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            next_node: 1,
            next_declaration: 1,
        }
    }

    pub fn node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub fn decl_id(&mut self) -> DeclId {
        let id = DeclId(self.next_declaration);
        self.next_declaration += 1;
        id
    }

    pub fn variable(&mut self, name: &str, ty: Type) -> VariableDeclaration {
        VariableDeclaration {
            id: self.decl_id(),
            name: name.to_string(),
            ty,
            is_constant: false,
            indexed: false,
        }
    }

    pub fn function_ref(&mut self, name: &str, parameter_types: Vec<Type>) -> FunctionRef {
        FunctionRef {
            id: self.decl_id(),
            name: name.to_string(),
            parameter_types,
        }
    }

    /// An event whose parameters are `(name, type, indexed)`.
    pub fn event(&mut self, name: &str, parameters: &[(&str, Type, bool)]) -> EventDefinition {
        let parameters = parameters
            .iter()
            .map(|(name, ty, indexed)| VariableDeclaration {
                indexed: *indexed,
                ..self.variable(name, ty.clone())
            })
            .collect();
        EventDefinition {
            id: self.decl_id(),
            name: name.to_string(),
            parameters,
            anonymous: false,
        }
    }

    pub fn expression(&mut self, ty: Type, kind: ExpressionKind) -> Expression {
        Expression {
            id: self.node_id(),
            ty,
            lvalue_requested: false,
            kind,
        }
    }

    /// A reference to a variable, typed like its declaration.
    pub fn identifier(&mut self, variable: &VariableDeclaration) -> Expression {
        self.reference(
            &variable.name,
            Declaration::Variable(variable.clone()),
            variable.ty.clone(),
        )
    }

    pub fn reference(&mut self, name: &str, declaration: Declaration, ty: Type) -> Expression {
        self.expression(
            ty,
            ExpressionKind::Identifier {
                name: name.to_string(),
                declaration,
            },
        )
    }

    /// An integer literal, typed as the rational constant it denotes.
    pub fn number(&mut self, value: i64) -> Expression {
        self.expression(
            Type::rational(value),
            ExpressionKind::Literal {
                value: value.to_string(),
            },
        )
    }

    pub fn bool(&mut self, value: bool) -> Expression {
        self.expression(
            Type::Bool,
            ExpressionKind::Literal {
                value: value.to_string(),
            },
        )
    }

    pub fn string_literal(&mut self, value: &str) -> Expression {
        self.expression(
            Type::StringLiteral(value.to_string()),
            ExpressionKind::Literal {
                value: value.to_string(),
            },
        )
    }

    /// `left op right`. Comparisons and `&&`/`||` yield `bool`, everything else `common_type`.
    pub fn binary(
        &mut self,
        operator: BinaryOperator,
        left: Expression,
        right: Expression,
        common_type: Type,
    ) -> Expression {
        let ty = if operator.is_comparison() || operator.is_boolean() {
            Type::Bool
        } else {
            common_type.clone()
        };
        self.expression(
            ty,
            ExpressionKind::BinaryOperation {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                common_type,
            },
        )
    }

    pub fn assign(&mut self, left: Expression, right: Expression) -> Expression {
        self.compound_assign(AssignmentOperator::Assign, left, right)
    }

    pub fn compound_assign(
        &mut self,
        operator: AssignmentOperator,
        left: Expression,
        right: Expression,
    ) -> Expression {
        let left = lvalue(left);
        self.expression(
            left.ty.clone(),
            ExpressionKind::Assignment {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    pub fn unary(&mut self, operator: UnaryOperator, prefix: bool, operand: Expression) -> Expression {
        let (ty, operand) = match operator {
            UnaryOperator::Delete => (Type::empty_tuple(), lvalue(operand)),
            UnaryOperator::Inc | UnaryOperator::Dec => (operand.ty.clone(), lvalue(operand)),
            UnaryOperator::Not => (Type::Bool, operand),
            _ => (operand.ty.clone(), operand),
        };
        self.expression(
            ty,
            ExpressionKind::UnaryOperation {
                operator,
                prefix,
                sub_expression: Box::new(operand),
            },
        )
    }

    pub fn conditional(
        &mut self,
        condition: Expression,
        true_expression: Expression,
        false_expression: Expression,
        ty: Type,
    ) -> Expression {
        self.expression(
            ty,
            ExpressionKind::Conditional {
                condition: Box::new(condition),
                true_expression: Box::new(true_expression),
                false_expression: Box::new(false_expression),
            },
        )
    }

    pub fn tuple(&mut self, components: Vec<Option<Expression>>) -> Expression {
        let ty = Type::Tuple(
            components
                .iter()
                .map(|component| component.as_ref().map(|c| c.ty.clone()))
                .collect(),
        );
        self.expression(
            ty,
            ExpressionKind::Tuple {
                components,
                is_inline_array: false,
            },
        )
    }

    pub fn call(&mut self, callee: Expression, arguments: Vec<Expression>, ty: Type) -> Expression {
        self.named_call(callee, arguments, Vec::new(), ty)
    }

    pub fn named_call(
        &mut self,
        callee: Expression,
        arguments: Vec<Expression>,
        names: Vec<String>,
        ty: Type,
    ) -> Expression {
        self.expression(
            ty,
            ExpressionKind::FunctionCall {
                kind: FunctionCallKind::FunctionCall,
                expression: Box::new(callee),
                arguments,
                names,
            },
        )
    }

    /// `T(argument)`.
    pub fn convert(&mut self, to: Type, argument: Expression) -> Expression {
        let callee = self.expression(
            Type::TypeType(Box::new(to.clone())),
            ExpressionKind::ElementaryTypeName {
                type_name: to.canonical_name(),
            },
        );
        self.expression(
            to,
            ExpressionKind::FunctionCall {
                kind: FunctionCallKind::TypeConversion,
                expression: Box::new(callee),
                arguments: vec![argument],
                names: Vec::new(),
            },
        )
    }

    pub fn member(
        &mut self,
        base: Expression,
        member: &str,
        ty: Type,
        referenced_declaration: Option<Declaration>,
    ) -> Expression {
        self.expression(
            ty,
            ExpressionKind::MemberAccess {
                expression: Box::new(base),
                member: member.to_string(),
                referenced_declaration,
            },
        )
    }

    pub fn index(&mut self, base: Expression, index: Expression, ty: Type) -> Expression {
        self.expression(
            ty,
            ExpressionKind::IndexAccess {
                base: Box::new(base),
                index: Some(Box::new(index)),
            },
        )
    }

    /// `T name = value;` (or `T name;`), returning the declaration for later references.
    pub fn local(
        &mut self,
        name: &str,
        ty: Type,
        value: Option<Expression>,
    ) -> (VariableDeclaration, Statement) {
        let declaration = self.variable(name, ty);
        let statement = Statement::VariableDeclaration {
            declarations: vec![Some(declaration.clone())],
            initial_value: value,
        };
        (declaration, statement)
    }
}

/// Marks `expression` as an assignment target, including the components of a tuple target.
pub fn lvalue(mut expression: Expression) -> Expression {
    expression.lvalue_requested = true;
    if let ExpressionKind::Tuple { components, .. } = &mut expression.kind {
        for component in components.iter_mut() {
            if let Some(inner) = component.take() {
                *component = Some(lvalue(inner));
            }
        }
    }
    expression
}
