use crate::yul::{Block, Expression, Statement};
use crate::{IrError, Result};

/// Append-only statement buffer with a stack of open frames for nested blocks.
#[derive(Debug)]
pub struct BlockBuilder {
    frames: Vec<Vec<Statement>>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push(&mut self, statement: Statement) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(statement);
        }
    }

    /// `let a, b := value`. Nothing is emitted for an empty name list.
    pub fn define(&mut self, variables: Vec<String>, value: Expression) {
        if variables.is_empty() {
            return;
        }
        self.push(Statement::VariableDeclaration {
            variables,
            value: Some(value),
        });
    }

    pub fn declare(&mut self, variables: Vec<String>) {
        if variables.is_empty() {
            return;
        }
        self.push(Statement::VariableDeclaration {
            variables,
            value: None,
        });
    }

    pub fn assign(&mut self, targets: Vec<String>, value: Expression) {
        if targets.is_empty() {
            return;
        }
        self.push(Statement::Assignment { targets, value });
    }

    pub fn expression(&mut self, expression: Expression) {
        self.push(Statement::Expression(expression));
    }

    pub fn open(&mut self) {
        self.frames.push(Vec::new());
    }

    pub fn close(&mut self) -> Result<Block> {
        if self.frames.len() <= 1 {
            return Err(IrError::BuilderError(
                "no nested block is open".to_string(),
            ));
        }
        let statements = self.frames.pop().unwrap_or_default();
        Ok(Block::new(statements))
    }

    pub fn finish(mut self) -> Result<Block> {
        if self.frames.len() != 1 {
            return Err(IrError::BuilderError(format!(
                "{} nested block(s) left open",
                self.frames.len() - 1
            )));
        }
        Ok(Block::new(self.frames.pop().unwrap_or_default()))
    }
}

impl Default for BlockBuilder {
    fn default() -> Self {
        Self::new()
    }
}
