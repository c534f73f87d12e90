use crate::{
    ast::{BinaryOperator, Expression, Program, Statement},
    tokenizer::{Token, TokenType},
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected \"{expected}\"")]
    Expected { expected: TokenType, offset: usize },
    #[error("unexpected \"{found}\"")]
    UnexpectedToken { found: TokenType, offset: usize },
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
}

impl ParseError {
    /// Byte offset into the source where the error was detected, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::Expected { offset, .. } => Some(*offset),
            ParseError::UnexpectedToken { offset, .. } => Some(*offset),
            ParseError::UnexpectedEndOfInput => None,
        }
    }
}

pub fn program(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut statements = Vec::new();
    let mut tokens = tokens;

    while !matches!(
        tokens.first().map(Token::token_type),
        None | Some(TokenType::Eof)
    ) {
        let (stmt, rest) = statement(tokens)?;
        statements.push(stmt);
        tokens = rest;
    }

    Ok(Program(statements))
}

fn statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseError> {
    match tokens.first().map(Token::token_type) {
        Some(TokenType::Var) => var_declaration(&tokens[1..]),
        Some(TokenType::Print) => print_statement(&tokens[1..]),
        Some(TokenType::If) => if_statement(&tokens[1..]),
        Some(TokenType::While) => while_statement(&tokens[1..]),
        _ => assignment_or_expression_statement(tokens),
    }
}

fn var_declaration(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseError> {
    let (name, tokens) = match_identifier(tokens)?;
    let tokens = consume(tokens, TokenType::Equal)?;
    let (expr, tokens) = expression(tokens)?;
    let tokens = statement_end(tokens)?;
    Ok((Statement::VarDeclaration(name, expr), tokens))
}

fn assignment_or_expression_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseError> {
    if let (Some(TokenType::Identifier(name)), Some(TokenType::Equal)) = (
        tokens.first().map(Token::token_type),
        tokens.get(1).map(Token::token_type),
    ) {
        let (expr, rest) = expression(&tokens[2..])?;
        let rest = statement_end(rest)?;
        return Ok((Statement::Assignment(name.clone(), expr), rest));
    }

    let (expr, rest) = expression(tokens)?;
    let rest = statement_end(rest)?;
    Ok((Statement::Expression(expr), rest))
}

fn print_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseError> {
    let tokens = consume(tokens, TokenType::LeftParen)?;
    let (expr, tokens) = expression(tokens)?;
    let tokens = consume(tokens, TokenType::RightParen)?;
    let tokens = statement_end(tokens)?;
    Ok((Statement::Print(expr), tokens))
}

fn if_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseError> {
    let tokens = consume(tokens, TokenType::LeftParen)?;
    let (condition, tokens) = expression(tokens)?;
    let tokens = consume(tokens, TokenType::RightParen)?;
    let (consequent, tokens) = block(tokens)?;

    if let Some(TokenType::Else) = tokens.first().map(Token::token_type) {
        // `else` must open a brace block; chained conditionals nest inside it
        let (alternate, tokens) = block(&tokens[1..])?;
        Ok((Statement::If(condition, consequent, Some(alternate)), tokens))
    } else {
        Ok((Statement::If(condition, consequent, None), tokens))
    }
}

fn while_statement(tokens: &[Token]) -> Result<(Statement, &[Token]), ParseError> {
    let tokens = consume(tokens, TokenType::LeftParen)?;
    let (condition, tokens) = expression(tokens)?;
    let tokens = consume(tokens, TokenType::RightParen)?;
    let (body, tokens) = block(tokens)?;
    Ok((Statement::While(condition, body), tokens))
}

fn block(tokens: &[Token]) -> Result<(Vec<Statement>, &[Token]), ParseError> {
    let mut tokens = consume(tokens, TokenType::LeftBrace)?;
    let mut statements = Vec::new();

    loop {
        match tokens.first().map(Token::token_type) {
            Some(TokenType::RightBrace) => return Ok((statements, &tokens[1..])),
            None | Some(TokenType::Eof) => return Err(ParseError::UnexpectedEndOfInput),
            _ => {
                let (stmt, rest) = statement(tokens)?;
                statements.push(stmt);
                tokens = rest;
            }
        }
    }
}

/// A statement ends with `;`, or implicitly at the end of the enclosing
/// block or the end of the program.
fn statement_end(tokens: &[Token]) -> Result<&[Token], ParseError> {
    match tokens.first() {
        Some(token) => match token.token_type() {
            TokenType::Semicolon => Ok(&tokens[1..]),
            TokenType::RightBrace | TokenType::Eof => Ok(tokens),
            _ => Err(ParseError::Expected {
                expected: TokenType::Semicolon,
                offset: token.offset(),
            }),
        },
        None => Ok(tokens),
    }
}

fn expression(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseError> {
    logical_or(tokens)
}

fn binary<'a>(
    precedence: impl Fn(&'a [Token]) -> Result<(Expression, &'a [Token]), ParseError>,
    operator: impl Fn(&TokenType) -> Option<BinaryOperator>,
    tokens: &'a [Token],
) -> Result<(Expression, &'a [Token]), ParseError> {
    let (mut expr, mut tokens) = precedence(tokens)?;

    while let Some(token) = tokens.first() {
        let op = match operator(token.token_type()) {
            Some(op) => op,
            None => break,
        };
        let (right, rest) = precedence(&tokens[1..])?;
        expr = Expression::Binary(Box::new(expr), op, Box::new(right));
        tokens = rest;
    }

    Ok((expr, tokens))
}

fn logical_or(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseError> {
    binary(
        logical_and,
        |token_type| match token_type {
            TokenType::OrOr => Some(BinaryOperator::Or),
            _ => None,
        },
        tokens,
    )
}

fn logical_and(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseError> {
    binary(
        equality,
        |token_type| match token_type {
            TokenType::AndAnd => Some(BinaryOperator::And),
            _ => None,
        },
        tokens,
    )
}

fn equality(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseError> {
    binary(
        comparison,
        |token_type| match token_type {
            TokenType::EqualEqual => Some(BinaryOperator::Equal),
            TokenType::BangEqual => Some(BinaryOperator::NotEqual),
            _ => None,
        },
        tokens,
    )
}

fn comparison(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseError> {
    binary(
        term,
        |token_type| match token_type {
            TokenType::Less => Some(BinaryOperator::LessThan),
            TokenType::LessEqual => Some(BinaryOperator::LessThanOrEqual),
            TokenType::Greater => Some(BinaryOperator::GreaterThan),
            TokenType::GreaterEqual => Some(BinaryOperator::GreaterThanOrEqual),
            _ => None,
        },
        tokens,
    )
}

fn term(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseError> {
    binary(
        factor,
        |token_type| match token_type {
            TokenType::Plus => Some(BinaryOperator::Plus),
            TokenType::Minus => Some(BinaryOperator::Minus),
            _ => None,
        },
        tokens,
    )
}

fn factor(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseError> {
    binary(
        primary,
        |token_type| match token_type {
            TokenType::Star => Some(BinaryOperator::Multiply),
            TokenType::Slash => Some(BinaryOperator::Divide),
            _ => None,
        },
        tokens,
    )
}

fn primary(tokens: &[Token]) -> Result<(Expression, &[Token]), ParseError> {
    let Some(token) = tokens.first() else {
        return Err(ParseError::UnexpectedEndOfInput);
    };

    match token.token_type() {
        TokenType::Number(n) => Ok((Expression::NumberLiteral(*n), &tokens[1..])),
        TokenType::String(s) => Ok((Expression::StringLiteral(s.clone()), &tokens[1..])),
        TokenType::Identifier(name) => Ok((Expression::Identifier(name.clone()), &tokens[1..])),
        TokenType::LeftParen => {
            let (expr, rest) = expression(&tokens[1..])?;
            let tokens = consume(rest, TokenType::RightParen)?;
            Ok((expr, tokens))
        }
        TokenType::Eof => Err(ParseError::UnexpectedEndOfInput),
        token_type => Err(ParseError::UnexpectedToken {
            found: token_type.clone(),
            offset: token.offset(),
        }),
    }
}

fn consume(tokens: &[Token], token_type: TokenType) -> Result<&[Token], ParseError> {
    match tokens.first() {
        Some(token) if token.token_type() == &token_type => Ok(&tokens[1..]),
        Some(token) if token.token_type() == &TokenType::Eof => {
            Err(ParseError::UnexpectedEndOfInput)
        }
        Some(token) => Err(ParseError::Expected {
            expected: token_type,
            offset: token.offset(),
        }),
        None => Err(ParseError::UnexpectedEndOfInput),
    }
}

fn match_identifier(tokens: &[Token]) -> Result<(String, &[Token]), ParseError> {
    match tokens.first() {
        Some(token) => match token.token_type() {
            TokenType::Identifier(name) => Ok((name.clone(), &tokens[1..])),
            _ => Err(ParseError::Expected {
                expected: TokenType::Identifier(String::new()),
                offset: token.offset(),
            }),
        },
        None => Err(ParseError::UnexpectedEndOfInput),
    }
}
