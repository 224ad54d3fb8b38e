//! Parser for form scripts → `SourceFile`.
//!
//! Built on `winnow` 0.7 for the token level (identifiers, numbers,
//! strings, trivia) with a small recursive-descent layer on top.
//! Handles: `let`/`const`/`var` declarations, expression statements,
//! `if`/`else`, blocks, function declarations and expressions (bodies are
//! skipped by brace matching), loops (headers skipped by paren matching),
//! object/array literals, calls, member access, and the usual operators.
//! Semicolons are optional.

use crate::error::ParseError;
use crate::model::Range;
use crate::syntax::*;
use winnow::ascii::{digit0, digit1, multispace0};
use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_until, take_while};

/// Parse a form script into a `SourceFile`.
#[must_use = "parsing result should be used"]
pub fn parse_script(input: &str, file_name: &str) -> Result<SourceFile, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = ScriptParser {
        source: input,
        tokens,
        pos: 0,
    };

    let mut statements = Vec::new();
    while !parser.at_eof() {
        statements.push(parser.parse_statement()?);
    }

    Ok(SourceFile {
        file_name: file_name.to_string(),
        statements,
        range: Range::new(0, input.len()),
    })
}

// ─── Tokens ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Ident(String),
    Number(String),
    Str(String),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    tok: Tok,
    /// Offset before the leading trivia.
    full_start: usize,
    /// Offset of the first character of the token itself.
    start: usize,
    end: usize,
}

/// Longest first, so `===` wins over `==` and `=`.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "...", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "*=", "/=", "++", "--",
    "=>", "{", "}", "(", ")", "[", "]", ";", ",", ".", "=", "<", ">", "+", "-", "*", "/", "%",
    "!", "?", ":",
];

fn offset(source: &str, rest: &str) -> usize {
    source.len() - rest.len()
}

fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut rest = source;
    let mut tokens = Vec::new();

    loop {
        let full_start = offset(source, rest);
        skip_trivia(&mut rest).map_err(|msg| ParseError::new(source, full_start, msg))?;
        let start = offset(source, rest);

        if rest.is_empty() {
            tokens.push(Token {
                tok: Tok::Eof,
                full_start,
                start,
                end: start,
            });
            return Ok(tokens);
        }

        let tok = lex_token(&mut rest).map_err(|msg| ParseError::new(source, start, msg))?;
        tokens.push(Token {
            tok,
            full_start,
            start,
            end: offset(source, rest),
        });
    }
}

fn lex_token(input: &mut &str) -> Result<Tok, &'static str> {
    let mut chars = input.chars();
    let first = chars.next().ok_or("unexpected end of input")?;
    let second = chars.next();

    if first.is_alphabetic() || first == '_' || first == '$' {
        return parse_identifier
            .parse_next(input)
            .map(|s| Tok::Ident(s.to_string()))
            .map_err(|_| "invalid identifier");
    }
    if first.is_ascii_digit() || (first == '.' && second.is_some_and(|c| c.is_ascii_digit())) {
        return parse_number
            .parse_next(input)
            .map(|s| Tok::Number(s.to_string()))
            .map_err(|_| "invalid numeric literal");
    }
    if first == '"' || first == '\'' {
        return parse_string(input).map(Tok::Str);
    }
    if let Some(punct) = PUNCTUATORS.iter().find(|p| input.starts_with(*p)) {
        *input = &input[punct.len()..];
        return Ok(Tok::Punct(*punct));
    }
    Err("unexpected character")
}

// ─── Low-level parsers ──────────────────────────────────────────────────

/// Skip whitespace, `//` line comments and `/* */` block comments.
fn skip_trivia(input: &mut &str) -> Result<(), &'static str> {
    loop {
        let _: ModalResult<&str> = multispace0.parse_next(input);
        if input.starts_with("//") {
            let _: ModalResult<&str> = take_till(0.., '\n').parse_next(input);
        } else if input.starts_with("/*") {
            let comment: ModalResult<(&str, &str, &str)> =
                ("/*", take_until(0.., "*/"), "*/").parse_next(input);
            if comment.is_err() {
                return Err("unterminated block comment");
            }
        } else {
            return Ok(());
        }
    }
}

fn parse_identifier<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_' || c == '$'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    )
        .take()
        .parse_next(input)
}

fn parse_number<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        (
            alt(("0x", "0X")),
            take_while(1.., |c: char| c.is_ascii_hexdigit()),
        )
            .take(),
        (
            alt(((digit1, opt(('.', digit0))).void(), ('.', digit1).void())),
            opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
        )
            .take(),
    ))
    .parse_next(input)
}

/// Parse a single- or double-quoted string, decoding escapes.
fn parse_string(input: &mut &str) -> Result<String, &'static str> {
    let mut chars = input.char_indices();
    let (_, quote) = chars.next().ok_or("expected string literal")?;
    let mut value = String::new();

    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => {
                *input = &input[i + c.len_utf8()..];
                return Ok(value);
            }
            '\n' => return Err("unterminated string literal"),
            '\\' => {
                let (_, esc) = chars.next().ok_or("unterminated string literal")?;
                match esc {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    '0' => value.push('\0'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    'v' => value.push('\u{b}'),
                    // Line continuation.
                    '\n' => {}
                    'x' => value.push(read_hex(&mut chars, 2)?),
                    'u' => {
                        let mut look = chars.clone();
                        if look.next().map(|(_, c)| c) == Some('{') {
                            chars = look;
                            let mut code = 0u32;
                            loop {
                                let (_, c) = chars.next().ok_or("unterminated string literal")?;
                                if c == '}' {
                                    break;
                                }
                                let digit = c.to_digit(16).ok_or("invalid escape sequence")?;
                                code = code.saturating_mul(16).saturating_add(digit);
                            }
                            value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                        } else {
                            value.push(read_hex(&mut chars, 4)?);
                        }
                    }
                    other => value.push(other),
                }
            }
            c => value.push(c),
        }
    }

    Err("unterminated string literal")
}

fn read_hex(chars: &mut std::str::CharIndices<'_>, digits: usize) -> Result<char, &'static str> {
    let mut code = 0u32;
    for _ in 0..digits {
        let (_, c) = chars.next().ok_or("unterminated string literal")?;
        code = code * 16 + c.to_digit(16).ok_or("invalid escape sequence")?;
    }
    Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
}

// ─── Recursive descent ──────────────────────────────────────────────────

struct ScriptParser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

fn binary_op(punct: &str) -> Option<(BinaryOp, u8)> {
    let op = match punct {
        "||" => (BinaryOp::Or, 1),
        "&&" => (BinaryOp::And, 2),
        "==" => (BinaryOp::Eq, 3),
        "!=" => (BinaryOp::NotEq, 3),
        "===" => (BinaryOp::StrictEq, 3),
        "!==" => (BinaryOp::StrictNotEq, 3),
        "<" => (BinaryOp::Less, 4),
        "<=" => (BinaryOp::LessEq, 4),
        ">" => (BinaryOp::Greater, 4),
        ">=" => (BinaryOp::GreaterEq, 4),
        "+" => (BinaryOp::Add, 5),
        "-" => (BinaryOp::Sub, 5),
        "*" => (BinaryOp::Mul, 6),
        "/" => (BinaryOp::Div, 6),
        "%" => (BinaryOp::Rem, 6),
        _ => return None,
    };
    Some(op)
}

fn assignment_op(punct: &str) -> Option<BinaryOp> {
    match punct {
        "=" => Some(BinaryOp::Assign),
        "+=" => Some(BinaryOp::AddAssign),
        "-=" => Some(BinaryOp::SubAssign),
        "*=" => Some(BinaryOp::MulAssign),
        "/=" => Some(BinaryOp::DivAssign),
        _ => None,
    }
}

impl ScriptParser<'_> {
    fn peek(&self) -> &Token {
        // The token list always ends with `Eof`, and `bump` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_nth(&self, n: usize) -> &Tok {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].tok
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if !matches!(token.tok, Tok::Eof) {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().tok, Tok::Eof)
    }

    fn is_punct(&self, punct: &str) -> bool {
        matches!(&self.peek().tok, Tok::Punct(p) if *p == punct)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().tok, Tok::Ident(name) if name == keyword)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.is_punct(punct) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<Token, ParseError> {
        if self.is_punct(punct) {
            Ok(self.bump())
        } else {
            Err(self.error(&format!("expected `{punct}`")))
        }
    }

    fn expect_ident(&mut self) -> Result<Ident, ParseError> {
        let token = self.peek().clone();
        match token.tok {
            Tok::Ident(name) => {
                self.bump();
                Ok(Ident {
                    name,
                    range: Range::new(token.full_start, token.end),
                })
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    /// Full start of the next token. A node beginning here starts there.
    fn start(&self) -> usize {
        self.peek().full_start
    }

    /// End of the last consumed token.
    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].end
        }
    }

    fn range_from(&self, start: usize) -> Range {
        Range::new(start, self.prev_end())
    }

    fn error(&self, expected: &str) -> ParseError {
        let token = self.peek();
        let found = match &token.tok {
            Tok::Ident(name) => format!("`{name}`"),
            Tok::Number(text) => format!("number `{text}`"),
            Tok::Str(_) => "string literal".to_string(),
            Tok::Punct(p) => format!("`{p}`"),
            Tok::Eof => "end of input".to_string(),
        };
        ParseError::new(self.source, token.start, format!("{expected}, found {found}"))
    }

    /// Skip a bracketed region, nesting included: `(...)`, `{...}`, `[...]`.
    fn skip_balanced(&mut self, open: &'static str, close: &'static str) -> Result<(), ParseError> {
        self.expect_punct(open)?;
        let mut depth = 1usize;
        while depth > 0 {
            if self.at_eof() {
                return Err(self.error(&format!("expected `{close}`")));
            }
            match self.bump().tok {
                Tok::Punct(p) if p == open => depth += 1,
                Tok::Punct(p) if p == close => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    // ─── Statements ─────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let start = self.start();
        let keyword = match &self.peek().tok {
            Tok::Ident(name) => Some(name.clone()),
            _ => None,
        };

        let kind = match keyword.as_deref() {
            Some("let" | "const" | "var") => {
                let list = self.parse_variable_list()?;
                self.eat_punct(";");
                StmtKind::Variable(list)
            }
            Some("if") => self.parse_if()?,
            Some("function") => {
                self.bump();
                let name = self.expect_ident()?;
                self.skip_balanced("(", ")")?;
                self.skip_balanced("{", "}")?;
                StmtKind::Function { name }
            }
            Some("return") => {
                self.bump();
                let value = if self.is_punct(";") || self.is_punct("}") || self.at_eof() {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                self.eat_punct(";");
                StmtKind::Return(value)
            }
            Some(word @ ("while" | "for")) => {
                let keyword = if word == "while" {
                    LoopKeyword::While
                } else {
                    LoopKeyword::For
                };
                self.bump();
                self.skip_balanced("(", ")")?;
                let body = self.parse_statement()?;
                StmtKind::Loop {
                    keyword,
                    body: Box::new(body),
                }
            }
            Some(word @ ("break" | "continue")) => {
                let kind = if word == "break" {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                };
                self.bump();
                self.eat_punct(";");
                kind
            }
            _ if self.is_punct("{") => StmtKind::Block(self.parse_block()?),
            _ if self.is_punct(";") => {
                self.bump();
                StmtKind::Empty
            }
            _ => {
                let expr = self.parse_expression()?;
                self.eat_punct(";");
                StmtKind::Expression(expr)
            }
        };

        Ok(Stmt {
            kind,
            range: self.range_from(start),
        })
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect_punct("{")?;
        let mut statements = Vec::new();
        while !self.is_punct("}") {
            if self.at_eof() {
                return Err(self.error("expected `}`"));
            }
            statements.push(self.parse_statement()?);
        }
        self.bump();
        Ok(statements)
    }

    fn parse_if(&mut self) -> Result<StmtKind, ParseError> {
        self.bump();
        self.expect_punct("(")?;
        let condition = self.parse_expression()?;
        self.expect_punct(")")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.is_keyword("else") {
            self.bump();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StmtKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn parse_variable_list(&mut self) -> Result<VariableList, ParseError> {
        let start = self.start();
        let keyword = match &self.bump().tok {
            Tok::Ident(word) if word == "const" => DeclKeyword::Const,
            Tok::Ident(word) if word == "var" => DeclKeyword::Var,
            _ => DeclKeyword::Let,
        };

        let mut declarations = Vec::new();
        loop {
            let decl_start = self.start();
            let target = if self.is_punct("{") {
                self.skip_balanced("{", "}")?;
                BindingTarget::Pattern(self.range_from(decl_start))
            } else if self.is_punct("[") {
                self.skip_balanced("[", "]")?;
                BindingTarget::Pattern(self.range_from(decl_start))
            } else {
                BindingTarget::Identifier(self.expect_ident()?)
            };
            let init = if self.eat_punct("=") {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            declarations.push(VariableDecl {
                target,
                init,
                range: self.range_from(decl_start),
            });
            if !self.eat_punct(",") {
                break;
            }
        }

        Ok(VariableList {
            keyword,
            declarations,
            range: self.range_from(start),
        })
    }

    // ─── Expressions ────────────────────────────────────────────────────

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let start = self.start();
        let left = self.parse_conditional()?;
        let op = match &self.peek().tok {
            Tok::Punct(p) => assignment_op(p),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(left);
        };
        self.bump();
        let right = self.parse_assignment()?;
        Ok(Expr {
            kind: ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            range: self.range_from(start),
        })
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let start = self.start();
        let condition = self.parse_binary(1)?;
        if !self.eat_punct("?") {
            return Ok(condition);
        }
        let then_value = self.parse_assignment()?;
        self.expect_punct(":")?;
        let else_value = self.parse_assignment()?;
        Ok(Expr {
            kind: ExprKind::Conditional {
                condition: Box::new(condition),
                then_value: Box::new(then_value),
                else_value: Box::new(else_value),
            },
            range: self.range_from(start),
        })
    }

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let start = self.start();
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.peek().tok {
                Tok::Punct(p) => binary_op(p),
                _ => None,
            };
            let Some((op, prec)) = op else { break };
            if prec < min_prec {
                break;
            }
            self.bump();
            let right = self.parse_binary(prec + 1)?;
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                range: self.range_from(start),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let start = self.start();
        let op = match &self.peek().tok {
            Tok::Punct("!") => Some(UnaryOp::Not),
            Tok::Punct("-") => Some(UnaryOp::Neg),
            Tok::Punct("+") => Some(UnaryOp::Plus),
            Tok::Punct("++") => Some(UnaryOp::Increment),
            Tok::Punct("--") => Some(UnaryOp::Decrement),
            Tok::Ident(word) if word == "typeof" => Some(UnaryOp::TypeOf),
            _ => None,
        };
        let Some(op) = op else {
            return self.parse_postfix();
        };
        self.bump();
        let operand = self.parse_unary()?;
        Ok(Expr {
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            range: self.range_from(start),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let start = self.start();
        let mut expr = self.parse_primary()?;
        loop {
            let kind = if self.eat_punct(".") {
                let property = self.expect_ident()?;
                ExprKind::Member {
                    object: Box::new(expr),
                    property,
                }
            } else if self.is_punct("(") {
                let args = self.parse_arguments()?;
                ExprKind::Call {
                    callee: Box::new(expr),
                    args,
                }
            } else if self.eat_punct("[") {
                let index = self.parse_expression()?;
                self.expect_punct("]")?;
                ExprKind::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                }
            } else if self.is_punct("++") || self.is_punct("--") {
                let op = if self.is_punct("++") {
                    UnaryOp::Increment
                } else {
                    UnaryOp::Decrement
                };
                self.bump();
                ExprKind::Unary {
                    op,
                    operand: Box::new(expr),
                }
            } else {
                break;
            };
            expr = Expr {
                kind,
                range: self.range_from(start),
            };
        }
        Ok(expr)
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect_punct("(")?;
        let mut args = Vec::new();
        while !self.eat_punct(")") {
            args.push(self.parse_assignment()?);
            if !self.eat_punct(",") {
                self.expect_punct(")")?;
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let start = self.start();
        let token = self.peek().clone();

        let kind = match token.tok {
            Tok::Number(text) => {
                self.bump();
                ExprKind::Number(text)
            }
            Tok::Str(value) => {
                self.bump();
                ExprKind::String(value)
            }
            Tok::Punct("(") => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect_punct(")")?;
                ExprKind::Paren(Box::new(inner))
            }
            Tok::Punct("{") => ExprKind::Object(self.parse_object_literal()?),
            Tok::Punct("[") => ExprKind::Array(self.parse_array_literal()?),
            Tok::Ident(word) => match word.as_str() {
                "true" => {
                    self.bump();
                    ExprKind::Bool(true)
                }
                "false" => {
                    self.bump();
                    ExprKind::Bool(false)
                }
                "null" => {
                    self.bump();
                    ExprKind::Null
                }
                "this" => {
                    self.bump();
                    ExprKind::This
                }
                "function" => {
                    self.bump();
                    if matches!(self.peek().tok, Tok::Ident(_)) {
                        self.bump();
                    }
                    self.skip_balanced("(", ")")?;
                    self.skip_balanced("{", "}")?;
                    ExprKind::Function
                }
                "new" => {
                    self.bump();
                    let callee = self.parse_new_callee()?;
                    let args = if self.is_punct("(") {
                        self.parse_arguments()?
                    } else {
                        Vec::new()
                    };
                    ExprKind::New {
                        callee: Box::new(callee),
                        args,
                    }
                }
                _ => {
                    self.bump();
                    ExprKind::Identifier(word.clone())
                }
            },
            _ => return Err(self.error("expected expression")),
        };

        Ok(Expr {
            kind,
            range: self.range_from(start),
        })
    }

    /// `new` binds to a member chain without calls: `new a.b.C(...)`.
    fn parse_new_callee(&mut self) -> Result<Expr, ParseError> {
        let start = self.start();
        let mut expr = self.parse_primary()?;
        while self.eat_punct(".") {
            let property = self.expect_ident()?;
            expr = Expr {
                kind: ExprKind::Member {
                    object: Box::new(expr),
                    property,
                },
                range: self.range_from(start),
            };
        }
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect_punct("[")?;
        let mut items = Vec::new();
        while !self.eat_punct("]") {
            items.push(self.parse_assignment()?);
            if !self.eat_punct(",") {
                self.expect_punct("]")?;
                break;
            }
        }
        Ok(items)
    }

    fn parse_object_literal(&mut self) -> Result<Vec<Property>, ParseError> {
        self.expect_punct("{")?;
        let mut properties = Vec::new();
        while !self.eat_punct("}") {
            properties.push(self.parse_property()?);
            if !self.eat_punct(",") {
                self.expect_punct("}")?;
                break;
            }
        }
        Ok(properties)
    }

    fn parse_property(&mut self) -> Result<Property, ParseError> {
        let start = self.start();
        let token = self.peek().clone();
        let name = match token.tok {
            Tok::Ident(name) => PropertyName::Identifier(Ident {
                name,
                range: Range::new(token.full_start, token.end),
            }),
            Tok::Str(value) => PropertyName::String(value),
            Tok::Number(text) => PropertyName::Number(text),
            _ => return Err(self.error("expected property name")),
        };
        self.bump();

        let kind = if self.is_punct("(") {
            self.skip_balanced("(", ")")?;
            self.skip_balanced("{", "}")?;
            PropertyKind::Method(name)
        } else if self.eat_punct(":") {
            let value = self.parse_assignment()?;
            PropertyKind::Assignment { name, value }
        } else {
            match name {
                PropertyName::Identifier(ident)
                    if matches!(self.peek_nth(0), Tok::Punct("," | "}")) =>
                {
                    PropertyKind::Shorthand(ident)
                }
                _ => return Err(self.error("expected `:`")),
            }
        };

        Ok(Property {
            kind,
            range: self.range_from(start),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> SourceFile {
        parse_script(src, "test.js").expect("parse failed")
    }

    #[test]
    fn ranges_include_leading_trivia() {
        let src = "let f = NewForm();\nf.Caption = \"a\";";
        let file = parse(src);
        assert_eq!(file.statements.len(), 2);
        assert_eq!(file.statements[0].range, Range::new(0, 18));
        // Second statement starts right after the first `;`, newline included.
        assert_eq!(file.statements[1].range, Range::new(18, src.len()));
    }

    #[test]
    fn call_arguments_keep_their_spans() {
        let src = "b.SetLayout(1, 2, 3, 4);";
        let file = parse(src);
        let StmtKind::Expression(expr) = &file.statements[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { args, .. } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 4);
        assert_eq!(&src[args[0].range.pos..args[0].range.end], "1");
        assert_eq!(&src[args[1].range.pos..args[1].range.end], " 2");
        assert_eq!(expr.range.end, src.len() - 1);
    }

    #[test]
    fn strings_are_unquoted_and_unescaped() {
        let file = parse(r#"let s = 'it\'s' + "a\tb";"#);
        let StmtKind::Variable(list) = &file.statements[0].kind else {
            panic!("expected variable statement");
        };
        let Some(Expr {
            kind: ExprKind::Binary { left, right, .. },
            ..
        }) = &list.declarations[0].init
        else {
            panic!("expected binary initializer");
        };
        assert_eq!(left.kind, ExprKind::String("it's".into()));
        assert_eq!(right.kind, ExprKind::String("a\tb".into()));
    }

    #[test]
    fn object_literal_members() {
        let file = parse("let o = { a: 1, b, c() { return 1; } };");
        let StmtKind::Variable(list) = &file.statements[0].kind else {
            panic!("expected variable statement");
        };
        let Some(Expr {
            kind: ExprKind::Object(props),
            ..
        }) = &list.declarations[0].init
        else {
            panic!("expected object literal");
        };
        assert_eq!(props.len(), 3);
        assert!(matches!(props[0].kind, PropertyKind::Assignment { .. }));
        assert!(matches!(props[1].kind, PropertyKind::Shorthand(_)));
        assert!(matches!(props[2].kind, PropertyKind::Method(_)));
    }

    #[test]
    fn function_bodies_and_loops_are_skipped() {
        let src = "function onClick(sender) { if (x) { y(); } }\nwhile (i < 3) { i++; }\nf.Show();";
        let file = parse(src);
        assert_eq!(file.statements.len(), 3);
        assert!(matches!(file.statements[0].kind, StmtKind::Function { .. }));
        assert!(matches!(file.statements[1].kind, StmtKind::Loop { .. }));
        assert!(matches!(file.statements[2].kind, StmtKind::Expression(_)));
    }

    #[test]
    fn comments_are_trivia() {
        let src = "// header\nlet a = 1; /* trailing */\nlet b = 2;";
        let file = parse(src);
        assert_eq!(file.statements.len(), 2);
        assert_eq!(file.statements[0].range.pos, 0);
    }

    #[test]
    fn destructuring_target_is_a_pattern() {
        let file = parse("let { a, b } = obj;");
        let StmtKind::Variable(list) = &file.statements[0].kind else {
            panic!("expected variable statement");
        };
        assert!(matches!(
            list.declarations[0].target,
            BindingTarget::Pattern(_)
        ));
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = parse_script("let a = ;\n", "bad.js").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 9);
        assert!(err.message.starts_with("expected expression"));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = parse_script("let a = \"abc\nlet b = 1;", "bad.js").unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn numbers_with_fraction_and_exponent() {
        let file = parse("x(1.5, .25, 1e3, 0xFF);");
        let StmtKind::Expression(Expr {
            kind: ExprKind::Call { args, .. },
            ..
        }) = &file.statements[0].kind
        else {
            panic!("expected call");
        };
        let texts: Vec<_> = args
            .iter()
            .map(|a| match &a.kind {
                ExprKind::Number(t) => t.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(texts, vec!["1.5", ".25", "1e3", "0xFF"]);
    }
}
