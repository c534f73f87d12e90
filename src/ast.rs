use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub struct Program(pub Vec<Statement>);

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    VarDeclaration(String, Expression),
    Assignment(String, Expression),
    Print(Expression),
    If(Expression, Vec<Statement>, Option<Vec<Statement>>),
    While(Expression, Vec<Statement>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    NumberLiteral(f64),
    StringLiteral(String),
    Identifier(String),
    Binary(Box<Expression>, BinaryOperator, Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    And,
    Or,
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for statement in &self.0 {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}

fn write_block(f: &mut std::fmt::Formatter<'_>, statements: &[Statement]) -> std::fmt::Result {
    writeln!(f, "{{")?;
    for statement in statements {
        writeln!(f, "{}", statement)?;
    }
    write!(f, "}}")
}

impl Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Expression(expr) => write!(f, "{};", expr),
            Statement::VarDeclaration(name, expr) => write!(f, "var {} = {};", name, expr),
            Statement::Assignment(name, expr) => write!(f, "{} = {};", name, expr),
            Statement::Print(expr) => write!(f, "print({});", expr),
            Statement::If(condition, consequent, alternate) => {
                write!(f, "if ({}) ", condition)?;
                write_block(f, consequent)?;
                if let Some(alternate) = alternate {
                    write!(f, " else ")?;
                    write_block(f, alternate)?;
                }
                Ok(())
            }
            Statement::While(condition, body) => {
                write!(f, "while ({}) ", condition)?;
                write_block(f, body)
            }
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::NumberLiteral(n) => write!(f, "{}", n),
            Expression::StringLiteral(s) => write!(f, "\"{}\"", s),
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::Binary(left, op, right) => write!(f, "({} {} {})", op, left, right),
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Equal => write!(f, "=="),
            BinaryOperator::NotEqual => write!(f, "!="),
            BinaryOperator::LessThan => write!(f, "<"),
            BinaryOperator::LessThanOrEqual => write!(f, "<="),
            BinaryOperator::GreaterThan => write!(f, ">"),
            BinaryOperator::GreaterThanOrEqual => write!(f, ">="),
            BinaryOperator::Plus => write!(f, "+"),
            BinaryOperator::Minus => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::And => write!(f, "&&"),
            BinaryOperator::Or => write!(f, "||"),
        }
    }
}
