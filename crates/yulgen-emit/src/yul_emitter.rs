use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
use std::io::Write;
use yulgen_core::yul::{to_compact_hex_with_prefix, Block, Expression, Literal, NumberFormat, Statement};

/// Prints a lowered function body as Yul source.
///
/// The top-level block is printed as a sequence of statements without enclosing braces, which is
/// how a function body is spliced into the surrounding `function` definition.
pub struct YulEmitter {
    config: EmitterConfig,
}

impl YulEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn plain() -> Self {
        Self::new(EmitterConfig::plain())
    }

    pub fn expression_to_string(&self, expression: &Expression) -> String {
        let context = self.context();
        self.format_expression(expression, &context)
    }

    fn format_expression(&self, expression: &Expression, context: &EmitContext) -> String {
        match expression {
            Expression::Literal(literal) => {
                EmitHelper::literal(context, &Self::format_literal(literal))
            }
            Expression::Identifier(name) => name.clone(),
            Expression::FunctionCall(call) => {
                let arguments: Vec<String> = call
                    .arguments
                    .iter()
                    .map(|argument| self.format_expression(argument, context))
                    .collect();
                format!("{}({})", call.function, arguments.join(", "))
            }
        }
    }

    fn format_literal(literal: &Literal) -> String {
        match literal {
            Literal::Number {
                value,
                format: NumberFormat::Decimal,
            } => value.to_string(),
            Literal::Number {
                value,
                format: NumberFormat::Hex,
            } => to_compact_hex_with_prefix(value),
            Literal::Bool(value) => value.to_string(),
            Literal::String(value) => format!("{:?}", value),
        }
    }

    /// Single-line rendering of statements that carry no nested block.
    fn inline(&self, statement: &Statement, context: &EmitContext) -> Option<String> {
        let text = match statement {
            Statement::VariableDeclaration { variables, value } => {
                let mut text = format!(
                    "{} {}",
                    EmitHelper::keyword(context, "let"),
                    variables.join(", ")
                );
                if let Some(value) = value {
                    text.push_str(" := ");
                    text.push_str(&self.format_expression(value, context));
                }
                text
            }
            Statement::Assignment { targets, value } => format!(
                "{} := {}",
                targets.join(", "),
                self.format_expression(value, context)
            ),
            Statement::Expression(expression) => self.format_expression(expression, context),
            Statement::Break => EmitHelper::keyword(context, "break"),
            Statement::Continue => EmitHelper::keyword(context, "continue"),
            Statement::Leave => EmitHelper::keyword(context, "leave"),
            _ => return None,
        };
        Some(text)
    }

    fn inline_block(&self, block: &Block, context: &EmitContext) -> Option<String> {
        match block.statements.as_slice() {
            [] => Some("{ }".to_string()),
            [single] if self.config.inline_simple_blocks => self
                .inline(single, context)
                .map(|text| format!("{{ {} }}", text)),
            _ => None,
        }
    }

    fn emit_braced<W: Write>(
        &self,
        writer: &mut W,
        header: &str,
        block: &Block,
        context: &mut EmitContext,
    ) -> EmitResult {
        if let Some(text) = self.inline_block(block, context) {
            return EmitHelper::write_line(writer, context, &format!("{}{}", header, text));
        }
        EmitHelper::write_line(writer, context, &format!("{}{{", header))?;
        self.emit_statements(writer, block, context)?;
        EmitHelper::write_line(writer, context, "}")
    }

    fn emit_statements<W: Write>(
        &self,
        writer: &mut W,
        block: &Block,
        context: &mut EmitContext,
    ) -> EmitResult {
        context.indent();
        for statement in &block.statements {
            self.emit_statement(writer, statement, context)?;
        }
        context.dedent();
        Ok(())
    }

    fn emit_statement<W: Write>(
        &self,
        writer: &mut W,
        statement: &Statement,
        context: &mut EmitContext,
    ) -> EmitResult {
        if let Some(text) = self.inline(statement, context) {
            return EmitHelper::write_line(writer, context, &text);
        }
        match statement {
            Statement::Block(block) => self.emit_braced(writer, "", block, context),
            Statement::If { condition, body } => {
                let header = format!(
                    "{} {} ",
                    EmitHelper::keyword(context, "if"),
                    self.format_expression(condition, context)
                );
                self.emit_braced(writer, &header, body, context)
            }
            Statement::Switch { expression, cases } => {
                let header = format!(
                    "{} {}",
                    EmitHelper::keyword(context, "switch"),
                    self.format_expression(expression, context)
                );
                EmitHelper::write_line(writer, context, &header)?;
                for case in cases {
                    let header = match &case.value {
                        Some(value) => format!(
                            "{} {} ",
                            EmitHelper::keyword(context, "case"),
                            EmitHelper::literal(context, &Self::format_literal(value))
                        ),
                        None => format!("{} ", EmitHelper::keyword(context, "default")),
                    };
                    self.emit_braced(writer, &header, &case.body, context)?;
                }
                Ok(())
            }
            Statement::ForLoop {
                pre,
                condition,
                post,
                body,
            } => {
                let keyword = EmitHelper::keyword(context, "for");
                let condition = self.format_expression(condition, context);
                match (self.inline_block(pre, context), self.inline_block(post, context)) {
                    (Some(pre), Some(post)) => EmitHelper::write_line(
                        writer,
                        context,
                        &format!("{} {} {} {}", keyword, pre, condition, post),
                    )?,
                    _ => {
                        EmitHelper::write_line(writer, context, &format!("{} {{", keyword))?;
                        self.emit_statements(writer, pre, context)?;
                        EmitHelper::write_line(writer, context, &format!("}} {} {{", condition))?;
                        self.emit_statements(writer, post, context)?;
                        EmitHelper::write_line(writer, context, "}")?;
                    }
                }
                self.emit_braced(writer, "", body, context)
            }
            Statement::FunctionDefinition {
                name,
                parameters,
                returns,
                body,
            } => {
                let mut header = format!(
                    "{} {}({})",
                    EmitHelper::keyword(context, "function"),
                    name,
                    parameters.join(", ")
                );
                if !returns.is_empty() {
                    header.push_str(&format!(" -> {}", returns.join(", ")));
                }
                header.push(' ');
                self.emit_braced(writer, &header, body, context)
            }
            _ => Ok(()),
        }
    }
}

impl Default for YulEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}

impl Emitter for YulEmitter {
    type Item = Block;

    fn emit<W: Write>(&self, item: &Block, writer: &mut W, context: &mut EmitContext) -> EmitResult {
        for statement in &item.statements {
            self.emit_statement(writer, statement, context)?;
        }
        Ok(())
    }

    fn context(&self) -> EmitContext {
        EmitContext {
            indent_level: 0,
            indent_chars: self.config.indent_style.to_string(),
            use_colors: self.config.use_colors,
        }
    }
}
