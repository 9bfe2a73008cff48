use crate::variable::IRVariable;
use yulgen_core::types::Type;
use yulgen_core::yul::Expression;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOffset {
    Static(u32),
    /// Name of the Yul variable holding the byte offset.
    Dynamic(String),
}

impl StorageOffset {
    pub fn expression(&self) -> Expression {
        match self {
            StorageOffset::Static(offset) => Expression::number(*offset),
            StorageOffset::Dynamic(name) => Expression::ident(name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LValueKind {
    Stack {
        variable: IRVariable,
    },
    Storage {
        slot: Expression,
        offset: StorageOffset,
    },
    Memory {
        address: Expression,
        byte_array_element: bool,
    },
    Tuple {
        components: Vec<Option<IRLValue>>,
    },
}

/// A location that can be read from and written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IRLValue {
    pub ty: Type,
    pub kind: LValueKind,
}

impl IRLValue {
    pub fn stack(variable: IRVariable) -> Self {
        Self {
            ty: variable.ty().clone(),
            kind: LValueKind::Stack { variable },
        }
    }

    pub fn storage(ty: Type, slot: Expression, offset: StorageOffset) -> Self {
        Self {
            ty,
            kind: LValueKind::Storage { slot, offset },
        }
    }

    pub fn memory(ty: Type, address: Expression, byte_array_element: bool) -> Self {
        Self {
            ty,
            kind: LValueKind::Memory {
                address,
                byte_array_element,
            },
        }
    }

    pub fn tuple(ty: Type, components: Vec<Option<IRLValue>>) -> Self {
        Self {
            ty,
            kind: LValueKind::Tuple { components },
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            LValueKind::Stack { .. } => "stack",
            LValueKind::Storage { .. } => "storage",
            LValueKind::Memory { .. } => "memory",
            LValueKind::Tuple { .. } => "tuple",
        }
    }
}
