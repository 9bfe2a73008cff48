use crate::hash;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataLocation {
    Storage,
    Memory,
    CallData,
}

impl DataLocation {
    fn identifier_suffix(&self) -> &'static str {
        match self {
            DataLocation::Storage => "storage",
            DataLocation::Memory => "memory_ptr",
            DataLocation::CallData => "calldata_ptr",
        }
    }
}

impl fmt::Display for DataLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataLocation::Storage => write!(f, "storage"),
            DataLocation::Memory => write!(f, "memory"),
            DataLocation::CallData => write!(f, "calldata"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArrayKind {
    #[default]
    Ordinary,
    Bytes,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayType {
    pub base: Box<Type>,
    pub length: Option<u64>,
    pub location: DataLocation,
    #[serde(default)]
    pub kind: ArrayKind,
}

impl ArrayType {
    pub fn is_byte_array(&self) -> bool {
        self.kind != ArrayKind::Ordinary
    }

    pub fn is_dynamically_sized(&self) -> bool {
        self.is_byte_array() || self.length.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructMember {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructType {
    pub name: String,
    pub members: Vec<StructMember>,
    pub location: DataLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MagicKind {
    Block,
    Message,
    Transaction,
    Abi,
    MetaType,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum StateMutability {
    Pure,
    View,
    #[default]
    NonPayable,
    Payable,
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateMutability::Pure => write!(f, "pure"),
            StateMutability::View => write!(f, "view"),
            StateMutability::NonPayable => write!(f, "nonpayable"),
            StateMutability::Payable => write!(f, "payable"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    Internal,
    External,
    DelegateCall,
    BareCall,
    BareCallCode,
    BareDelegateCall,
    BareStaticCall,
    Creation,
    Send,
    Transfer,
    Keccak256,
    Selfdestruct,
    Revert,
    ECRecover,
    SHA256,
    RIPEMD160,
    Log0,
    Log1,
    Log2,
    Log3,
    Log4,
    GasLeft,
    Event,
    SetGas,
    SetValue,
    BlockHash,
    AddMod,
    MulMod,
    ArrayPush,
    ArrayPop,
    ByteArrayPush,
    ObjectCreation,
    Assert,
    Require,
    ABIEncode,
    ABIEncodePacked,
    ABIEncodeWithSelector,
    ABIEncodeWithSignature,
    ABIDecode,
    MetaType,
    Declaration,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
    pub kind: FunctionKind,
    #[serde(default)]
    pub parameter_types: Vec<Type>,
    #[serde(default)]
    pub return_types: Vec<Type>,
    #[serde(default)]
    pub parameter_names: Vec<String>,
    #[serde(default)]
    pub state_mutability: StateMutability,
    #[serde(default)]
    pub gas_set: bool,
    #[serde(default)]
    pub value_set: bool,
    #[serde(default)]
    pub bound: bool,
    #[serde(default)]
    pub arbitrary_parameters: bool,
}

impl FunctionType {
    pub fn new(kind: FunctionKind, parameter_types: Vec<Type>, return_types: Vec<Type>) -> Self {
        Self {
            kind,
            parameter_types,
            return_types,
            parameter_names: Vec::new(),
            state_mutability: StateMutability::NonPayable,
            gas_set: false,
            value_set: false,
            bound: false,
            arbitrary_parameters: false,
        }
    }

    pub fn is_bare_call(&self) -> bool {
        matches!(
            self.kind,
            FunctionKind::BareCall
                | FunctionKind::BareCallCode
                | FunctionKind::BareDelegateCall
                | FunctionKind::BareStaticCall
        )
    }

    /// Whether arguments are encoded with standard 32-byte ABI padding.
    pub fn pads_arguments(&self) -> bool {
        !(self.is_bare_call()
            || matches!(
                self.kind,
                FunctionKind::SHA256
                    | FunctionKind::RIPEMD160
                    | FunctionKind::Keccak256
                    | FunctionKind::ABIEncodePacked
            ))
    }

    pub fn stack_items(&self) -> Vec<StackItem> {
        let mut items = Vec::new();
        match self.kind {
            FunctionKind::Internal => items.push(StackItem::word("functionIdentifier")),
            FunctionKind::External | FunctionKind::DelegateCall => {
                items.push(StackItem::word("address"));
                items.push(StackItem::word("functionIdentifier"));
            }
            FunctionKind::BareCall
            | FunctionKind::BareCallCode
            | FunctionKind::BareDelegateCall
            | FunctionKind::BareStaticCall
            | FunctionKind::Send
            | FunctionKind::Transfer => items.push(StackItem::word("address")),
            FunctionKind::ArrayPush | FunctionKind::ArrayPop | FunctionKind::ByteArrayPush => {
                items.push(StackItem::word("slot"))
            }
            _ => {}
        }
        if self.gas_set {
            items.push(StackItem::word("gas"));
        }
        if self.value_set {
            items.push(StackItem::word("value"));
        }
        items
    }

    fn identifier(&self) -> String {
        let kind = format!("{:?}", self.kind).to_lowercase();
        format!(
            "t_function_{}_{}{}returns{}",
            kind,
            self.state_mutability,
            identifier_list(self.parameter_types.iter()),
            identifier_list(self.return_types.iter()),
        )
    }
}

/// One named machine word of a value, or a typed sub-value for tuple components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackItem {
    pub name: String,
    pub ty: Option<Type>,
}

impl StackItem {
    pub fn word(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: None,
        }
    }
}

/// Semantic types as resolved by the front-end type checker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Integer { bits: u16, signed: bool },
    RationalNumber(BigInt),
    Bool,
    Address { payable: bool },
    FixedBytes(u8),
    StringLiteral(String),
    Array(ArrayType),
    Mapping { key: Box<Type>, value: Box<Type> },
    Struct(StructType),
    Enum { name: String, members: Vec<String> },
    Contract { name: String, is_super: bool },
    Function(Box<FunctionType>),
    Tuple(Vec<Option<Type>>),
    Magic(MagicKind),
    TypeType(Box<Type>),
}

impl Type {
    pub fn uint(bits: u16) -> Self {
        Type::Integer {
            bits,
            signed: false,
        }
    }

    pub fn int(bits: u16) -> Self {
        Type::Integer { bits, signed: true }
    }

    pub fn uint256() -> Self {
        Self::uint(256)
    }

    pub fn address() -> Self {
        Type::Address { payable: false }
    }

    pub fn rational(value: i64) -> Self {
        Type::RationalNumber(BigInt::from(value))
    }

    pub fn empty_tuple() -> Self {
        Type::Tuple(Vec::new())
    }

    pub fn tuple(components: Vec<Type>) -> Self {
        Type::Tuple(components.into_iter().map(Some).collect())
    }

    pub fn array(base: Type, length: Option<u64>, location: DataLocation) -> Self {
        Type::Array(ArrayType {
            base: Box::new(base),
            length,
            location,
            kind: ArrayKind::Ordinary,
        })
    }

    pub fn bytes(location: DataLocation) -> Self {
        Type::Array(ArrayType {
            base: Box::new(Type::FixedBytes(1)),
            length: None,
            location,
            kind: ArrayKind::Bytes,
        })
    }

    pub fn string(location: DataLocation) -> Self {
        Type::Array(ArrayType {
            base: Box::new(Type::FixedBytes(1)),
            length: None,
            location,
            kind: ArrayKind::String,
        })
    }

    pub fn mapping(key: Type, value: Type) -> Self {
        Type::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn function(function: FunctionType) -> Self {
        Type::Function(Box::new(function))
    }

    pub fn is_value_type(&self) -> bool {
        match self {
            Type::Integer { .. }
            | Type::RationalNumber(_)
            | Type::Bool
            | Type::Address { .. }
            | Type::FixedBytes(_)
            | Type::Enum { .. }
            | Type::Function(_) => true,
            Type::Contract { is_super, .. } => !is_super,
            _ => false,
        }
    }

    pub fn is_signed_integer(&self) -> bool {
        matches!(self, Type::Integer { signed: true, .. })
    }

    pub fn is_empty_tuple(&self) -> bool {
        matches!(self, Type::Tuple(components) if components.is_empty())
    }

    pub fn location(&self) -> Option<DataLocation> {
        match self {
            Type::Array(array) => Some(array.location),
            Type::Struct(structure) => Some(structure.location),
            Type::Mapping { .. } => Some(DataLocation::Storage),
            _ => None,
        }
    }

    pub fn data_stored_in(&self, location: DataLocation) -> bool {
        self.location() == Some(location)
    }

    /// Copy of a reference type moved to another data location.
    pub fn with_location(&self, location: DataLocation) -> Type {
        match self {
            Type::Array(array) => Type::Array(ArrayType {
                location,
                ..array.clone()
            }),
            Type::Struct(structure) => Type::Struct(StructType {
                location,
                ..structure.clone()
            }),
            other => other.clone(),
        }
    }

    /// The named words (or typed sub-values) a value of this type occupies, in order.
    pub fn stack_items(&self) -> Vec<StackItem> {
        match self {
            Type::Array(_) | Type::Struct(_) | Type::Mapping { .. } => {
                match self.location().unwrap_or(DataLocation::Storage) {
                    DataLocation::Storage => vec![StackItem::word("slot")],
                    DataLocation::Memory => vec![StackItem::word("mpos")],
                    DataLocation::CallData => {
                        let dynamic = matches!(self, Type::Array(a) if a.is_dynamically_sized());
                        if dynamic {
                            vec![StackItem::word("offset"), StackItem::word("length")]
                        } else {
                            vec![StackItem::word("offset")]
                        }
                    }
                }
            }
            Type::Function(function) => function.stack_items(),
            Type::Tuple(components) => components
                .iter()
                .enumerate()
                .filter_map(|(i, component)| {
                    component.as_ref().map(|ty| StackItem {
                        name: format!("component_{}", i + 1),
                        ty: Some(ty.clone()),
                    })
                })
                .collect(),
            Type::Contract { is_super: true, .. } => Vec::new(),
            Type::StringLiteral(_) | Type::Magic(_) | Type::TypeType(_) => Vec::new(),
            _ => vec![StackItem::word("")],
        }
    }

    pub fn size_on_stack(&self) -> usize {
        self.stack_items()
            .iter()
            .map(|item| item.ty.as_ref().map_or(1, |ty| ty.size_on_stack()))
            .sum()
    }

    pub fn is_dynamically_sized(&self) -> bool {
        match self {
            Type::Array(array) => array.is_dynamically_sized(),
            _ => false,
        }
    }

    /// Whether the ABI encoding of this type has a dynamic (offset-addressed) part.
    pub fn is_dynamically_encoded(&self) -> bool {
        match self {
            Type::Array(array) => {
                array.is_dynamically_sized() || array.base.is_dynamically_encoded()
            }
            Type::Struct(structure) => structure
                .members
                .iter()
                .any(|member| member.ty.is_dynamically_encoded()),
            Type::Tuple(components) => components
                .iter()
                .flatten()
                .any(|component| component.is_dynamically_encoded()),
            _ => false,
        }
    }

    /// Size of the static ABI encoding in bytes.
    pub fn calldata_encoded_size(&self) -> u64 {
        match self {
            Type::Array(array) if !array.is_dynamically_sized() => {
                array.length.unwrap_or(0) * array.base.calldata_encoded_size()
            }
            Type::Struct(structure) => structure
                .members
                .iter()
                .map(|member| member.ty.calldata_encoded_size())
                .sum(),
            Type::Tuple(components) => components
                .iter()
                .flatten()
                .map(|component| component.calldata_encoded_size())
                .sum(),
            Type::StringLiteral(_) | Type::Magic(_) | Type::TypeType(_) => 0,
            _ => 32,
        }
    }

    /// The type a literal settles into when it has to live in a variable.
    pub fn mobile_type(&self) -> Type {
        match self {
            Type::RationalNumber(value) => integer_type_for(value),
            Type::StringLiteral(_) => Type::string(DataLocation::Memory),
            Type::Tuple(components) => Type::Tuple(
                components
                    .iter()
                    .map(|component| component.as_ref().map(Type::mobile_type))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Type of a temporary holding this value while it is assigned to a location of `target`.
    pub fn closest_temporary_type(&self, target: &Type) -> Type {
        match (self, target) {
            (Type::Tuple(components), Type::Tuple(targets)) => {
                let mut temporaries = vec![None; targets.len()];
                for (i, slot) in temporaries.iter_mut().enumerate() {
                    if let (Some(Some(component)), Some(target)) =
                        (components.get(i), targets[i].as_ref())
                    {
                        *slot = Some(component.closest_temporary_type(target));
                    }
                }
                Type::Tuple(temporaries)
            }
            _ if target.data_stored_in(DataLocation::Storage) => self.mobile_type(),
            _ => target.clone(),
        }
    }

    /// Two's complement 256-bit value of a rational constant.
    pub fn literal_value(&self) -> Option<BigUint> {
        match self {
            Type::RationalNumber(value) => Some(to_u256(value)),
            _ => None,
        }
    }

    /// Parameter types of the public getter generated for a state variable of this type.
    pub fn getter_parameter_types(&self) -> Vec<Type> {
        match self {
            Type::Mapping { key, value } => {
                let mut params = vec![key.as_ref().clone()];
                params.extend(value.getter_parameter_types());
                params
            }
            Type::Array(array) if !array.is_byte_array() => {
                let mut params = vec![Type::uint256()];
                params.extend(array.base.getter_parameter_types());
                params
            }
            _ => Vec::new(),
        }
    }

    /// Name used in ABI signatures.
    pub fn canonical_name(&self) -> String {
        match self {
            Type::Integer { bits, signed } => {
                format!("{}int{}", if *signed { "" } else { "u" }, bits)
            }
            Type::Bool => "bool".to_string(),
            Type::Address { .. } | Type::Contract { .. } => "address".to_string(),
            Type::FixedBytes(n) => format!("bytes{}", n),
            Type::Enum { .. } => "uint8".to_string(),
            Type::Array(array) => match array.kind {
                ArrayKind::Bytes => "bytes".to_string(),
                ArrayKind::String => "string".to_string(),
                ArrayKind::Ordinary => match array.length {
                    Some(length) => format!("{}[{}]", array.base.canonical_name(), length),
                    None => format!("{}[]", array.base.canonical_name()),
                },
            },
            Type::Struct(structure) => format!(
                "({})",
                structure
                    .members
                    .iter()
                    .map(|member| member.ty.canonical_name())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
            Type::Function(_) => "function".to_string(),
            other => other.to_string(),
        }
    }

    /// Identifier-safe unique name, used to key and name helper functions.
    pub fn identifier(&self) -> String {
        match self {
            Type::Integer { bits, signed } => {
                format!("t_{}int{}", if *signed { "" } else { "u" }, bits)
            }
            Type::RationalNumber(value) => {
                if value.is_negative() {
                    format!("t_rational_minus_{}_by_1", value.abs())
                } else {
                    format!("t_rational_{}_by_1", value)
                }
            }
            Type::Bool => "t_bool".to_string(),
            Type::Address { payable } => {
                if *payable {
                    "t_address_payable".to_string()
                } else {
                    "t_address".to_string()
                }
            }
            Type::FixedBytes(n) => format!("t_bytes{}", n),
            Type::StringLiteral(value) => format!(
                "t_stringliteral_{}",
                hash::to_hex(&hash::keccak256(value.as_bytes()))
            ),
            Type::Array(array) => {
                let suffix = array.location.identifier_suffix();
                match array.kind {
                    ArrayKind::Bytes => format!("t_bytes_{}", suffix),
                    ArrayKind::String => format!("t_string_{}", suffix),
                    ArrayKind::Ordinary => format!(
                        "t_array$_{}_${}_{}",
                        array.base.identifier(),
                        array
                            .length
                            .map_or_else(|| "dyn".to_string(), |length| length.to_string()),
                        suffix
                    ),
                }
            }
            Type::Mapping { key, value } => {
                format!("t_mapping$_{}_$_{}_$", key.identifier(), value.identifier())
            }
            Type::Struct(structure) => format!(
                "t_struct$_{}_$_{}",
                structure.name,
                structure.location.identifier_suffix()
            ),
            Type::Enum { name, .. } => format!("t_enum$_{}_$", name),
            Type::Contract { name, is_super } => {
                if *is_super {
                    format!("t_super$_{}_$", name)
                } else {
                    format!("t_contract$_{}_$", name)
                }
            }
            Type::Function(function) => function.identifier(),
            Type::Tuple(components) => {
                if components.is_empty() {
                    "t_tuple$__$".to_string()
                } else {
                    format!(
                        "t_tuple{}",
                        identifier_list(components.iter().map(|component| {
                            component.clone().unwrap_or_else(Type::empty_tuple)
                        }))
                    )
                }
            }
            Type::Magic(kind) => format!("t_magic_{:?}", kind).to_lowercase(),
            Type::TypeType(actual) => format!("t_type${}_$", actual.identifier()),
        }
    }
}

fn identifier_list<T: Borrow<Type>>(types: impl Iterator<Item = T>) -> String {
    let names: Vec<String> = types.map(|ty| ty.borrow().identifier()).collect();
    format!("$_{}_$", names.join("_$_"))
}

fn integer_type_for(value: &BigInt) -> Type {
    let round_up = |bits: u64| -> u16 { (bits.div_ceil(8) * 8).clamp(8, 256) as u16 };
    if value.is_negative() {
        let magnitude: BigInt = -value - BigInt::one();
        Type::int(round_up(magnitude.bits() + 1))
    } else {
        Type::uint(round_up(value.bits()))
    }
}

fn to_u256(value: &BigInt) -> BigUint {
    let modulus = BigUint::one() << 256;
    match value.sign() {
        Sign::Minus => {
            let magnitude: BigUint = value.magnitude() % &modulus;
            if magnitude.is_zero() {
                magnitude
            } else {
                modulus - magnitude
            }
        }
        _ => value.magnitude() % modulus,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Integer { bits, signed } => {
                write!(f, "{}int{}", if *signed { "" } else { "u" }, bits)
            }
            Type::RationalNumber(value) => write!(f, "int_const {}", value),
            Type::Bool => write!(f, "bool"),
            Type::Address { payable } => {
                write!(f, "address{}", if *payable { " payable" } else { "" })
            }
            Type::FixedBytes(n) => write!(f, "bytes{}", n),
            Type::StringLiteral(value) => write!(f, "literal_string {:?}", value),
            Type::Array(array) => match array.kind {
                ArrayKind::Bytes => write!(f, "bytes {}", array.location),
                ArrayKind::String => write!(f, "string {}", array.location),
                ArrayKind::Ordinary => match array.length {
                    Some(length) => write!(f, "{}[{}] {}", array.base, length, array.location),
                    None => write!(f, "{}[] {}", array.base, array.location),
                },
            },
            Type::Mapping { key, value } => write!(f, "mapping({} => {})", key, value),
            Type::Struct(structure) => {
                write!(f, "struct {} {}", structure.name, structure.location)
            }
            Type::Enum { name, .. } => write!(f, "enum {}", name),
            Type::Contract { name, is_super } => {
                if *is_super {
                    write!(f, "contract super {}", name)
                } else {
                    write!(f, "contract {}", name)
                }
            }
            Type::Function(function) => {
                let params: Vec<String> =
                    function.parameter_types.iter().map(|t| t.to_string()).collect();
                let returns: Vec<String> =
                    function.return_types.iter().map(|t| t.to_string()).collect();
                write!(f, "function ({})", params.join(","))?;
                if !returns.is_empty() {
                    write!(f, " returns ({})", returns.join(","))?;
                }
                Ok(())
            }
            Type::Tuple(components) => {
                let parts: Vec<String> = components
                    .iter()
                    .map(|c| c.as_ref().map(|t| t.to_string()).unwrap_or_default())
                    .collect();
                write!(f, "tuple({})", parts.join(","))
            }
            Type::Magic(kind) => match kind {
                MagicKind::Block => write!(f, "block"),
                MagicKind::Message => write!(f, "msg"),
                MagicKind::Transaction => write!(f, "tx"),
                MagicKind::Abi => write!(f, "abi"),
                MagicKind::MetaType => write!(f, "type"),
            },
            Type::TypeType(actual) => write!(f, "type({})", actual),
        }
    }
}
