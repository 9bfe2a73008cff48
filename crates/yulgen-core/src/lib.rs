/*! Core data model for lowering contract code to Yul.
 *
 * The code generator needs two vocabularies: the semantic types the front-end resolved, and the
 * block-structured Yul it emits. This crate provides both, plus the small pieces every lowering
 * pass shares: an append-only statement buffer, a fresh-name dispenser and keccak-256 hashing.
 */

pub mod builder;
pub mod hash;
pub mod names;
pub mod types;
pub mod yul;

pub use builder::BlockBuilder;
pub use names::NameDispenser;
pub use types::{
    ArrayKind, ArrayType, DataLocation, FunctionKind, FunctionType, MagicKind, StackItem,
    StateMutability, StructMember, StructType, Type,
};
pub use yul::{Block, Case, Expression, FunctionCall, Literal, NumberFormat, Statement};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IrError>;

impl Block {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}

#[cfg(test)]
mod tests;
