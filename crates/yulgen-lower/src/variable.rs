use crate::ast::{Expression, VariableDeclaration};
use crate::errors::{CodegenError, Result};
use crate::invariant;
use yulgen_core::types::Type;
use yulgen_core::yul;

/// A source-level value spread over zero or more Yul variables.
///
/// The shape is a pure function of the type: a `uint256` is one variable named after the value,
/// a dynamic calldata array is `<name>_offset` and `<name>_length`, a tuple is the concatenation
/// of its components `<name>_component_<i>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IRVariable {
    base_name: String,
    ty: Type,
}

/// One element of a value's layout: a raw word, or a typed sub-value (tuple component).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariablePart {
    Word(String),
    Value(IRVariable),
}

impl IRVariable {
    pub fn new(base_name: impl Into<String>, ty: Type) -> Self {
        Self {
            base_name: base_name.into(),
            ty,
        }
    }

    /// The value computed by an expression node.
    pub fn from_expression(expression: &Expression) -> Self {
        Self::new(format!("expr_{}", expression.id), expression.ty.clone())
    }

    /// The value of a local variable or parameter.
    pub fn local(declaration: &VariableDeclaration) -> Self {
        Self::new(
            format!("vloc_{}_{}", declaration.name, declaration.id),
            declaration.ty.clone(),
        )
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    fn suffixed_name(&self, suffix: &str) -> String {
        if suffix.is_empty() {
            self.base_name.clone()
        } else {
            format!("{}_{}", self.base_name, suffix)
        }
    }

    pub fn parts(&self) -> Vec<VariablePart> {
        self.ty
            .stack_items()
            .into_iter()
            .map(|item| match item.ty {
                Some(ty) => VariablePart::Value(IRVariable::new(self.suffixed_name(&item.name), ty)),
                None => VariablePart::Word(self.suffixed_name(&item.name)),
            })
            .collect()
    }

    /// Yul identifier of the untyped word called `name`, e.g. `slot` or `functionIdentifier`.
    pub fn part(&self, name: &str) -> Result<String> {
        for item in self.ty.stack_items() {
            if item.name == name {
                invariant!(
                    item.ty.is_none(),
                    "Stack item {} of {} is a typed component",
                    name,
                    self.ty
                );
                return Ok(self.suffixed_name(name));
            }
        }
        Err(CodegenError::invariant(format!(
            "Invalid stack item name {:?} for {}",
            name, self.ty
        )))
    }

    pub fn part_expression(&self, name: &str) -> Result<yul::Expression> {
        Ok(yul::Expression::ident(self.part(name)?))
    }

    /// Component `index` (zero based) of a tuple-typed value.
    pub fn tuple_component(&self, index: usize) -> Result<IRVariable> {
        match &self.ty {
            Type::Tuple(components) => match components.get(index) {
                Some(Some(ty)) => Ok(IRVariable::new(
                    self.suffixed_name(&format!("component_{}", index + 1)),
                    ty.clone(),
                )),
                _ => Err(CodegenError::invariant(format!(
                    "Tuple component {} of {} is absent",
                    index, self.ty
                ))),
            },
            other => Err(CodegenError::invariant(format!(
                "Requested tuple component of non-tuple type {}",
                other
            ))),
        }
    }

    /// All Yul identifiers of this value, flattened in order.
    pub fn stack_slots(&self) -> Vec<String> {
        let mut slots = Vec::new();
        for part in self.parts() {
            match part {
                VariablePart::Word(name) => slots.push(name),
                VariablePart::Value(value) => slots.extend(value.stack_slots()),
            }
        }
        slots
    }

    pub fn expressions(&self) -> Vec<yul::Expression> {
        yul::Expression::idents(&self.stack_slots())
    }

    /// Name of a single-word value.
    pub fn name(&self) -> Result<String> {
        invariant!(
            self.ty.size_on_stack() == 1,
            "Value of type {} does not fit a single stack slot",
            self.ty
        );
        let mut slots = self.stack_slots();
        slots
            .pop()
            .ok_or_else(|| CodegenError::invariant("empty single-slot value"))
    }

    pub fn expression(&self) -> Result<yul::Expression> {
        Ok(yul::Expression::ident(self.name()?))
    }
}
