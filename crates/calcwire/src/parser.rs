//! Formula language: lexer, pratt parser and the compiled [`Formula`].

use ariadne::{Config, Label, Report, ReportKind, Source};
use chumsky::{input::ValueInput, pratt::*, prelude::*};
use indexmap::IndexSet;
use std::fmt;

use crate::error::FormulaError;

mod lexer;
pub use lexer::{Token, lexer};

mod references;
pub use references::collect_references;

pub use chumsky::prelude::{Input, Parser};

pub type Span = SimpleSpan;
pub type ParseError<'code, T> = Rich<'code, T, Span>;

#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub span: Span,
    pub node: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Power,
    Multiply,
    Divide,
    Remainder,
    Add,
    Subtract,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    And,
    Or,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    Variable(String),
    Call {
        name: String,
        arguments: Vec<Spanned<Expression>>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Spanned<Expression>>,
    },
    Binary {
        operator: BinaryOperator,
        operand_a: Box<Spanned<Expression>>,
        operand_b: Box<Spanned<Expression>>,
    },
    Conditional {
        condition: Box<Spanned<Expression>>,
        then: Box<Spanned<Expression>>,
        otherwise: Box<Spanned<Expression>>,
    },
}

fn binary(
    operator: BinaryOperator,
    operand_a: Spanned<Expression>,
    operand_b: Spanned<Expression>,
    span: Span,
) -> Spanned<Expression> {
    Spanned {
        span,
        node: Expression::Binary {
            operator,
            operand_a: Box::new(operand_a),
            operand_b: Box::new(operand_b),
        },
    }
}

fn unary(operator: UnaryOperator, operand: Spanned<Expression>, span: Span) -> Spanned<Expression> {
    Spanned {
        span,
        node: Expression::Unary {
            operator,
            operand: Box::new(operand),
        },
    }
}

pub fn parser<'code, I>()
-> impl Parser<'code, I, Spanned<Expression>, extra::Err<ParseError<'code, Token<'code>>>>
where
    I: ValueInput<'code, Token = Token<'code>, Span = Span>,
{
    recursive(|expression| {
        let bracket_round_open = just(Token::BracketRoundOpen);
        let bracket_round_close = just(Token::BracketRoundClose);

        let identifier = select! { Token::Identifier(identifier) => identifier };

        let literal = select! {
            Token::Number(number) => Literal::Number(number),
            Token::Text(text) => Literal::Text(text.to_owned()),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
        }
        .map(Expression::Literal);

        let call = identifier
            .then(
                expression
                    .clone()
                    .separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(bracket_round_open.clone(), bracket_round_close.clone()),
            )
            .map(|(name, arguments): (&str, _)| Expression::Call {
                name: name.to_owned(),
                arguments,
            });

        let variable = identifier.map(|name: &str| Expression::Variable(name.to_owned()));

        let nested = expression
            .clone()
            .delimited_by(bracket_round_open, bracket_round_close);

        let atom = choice((literal, call, variable))
            .map_with(|expression, extra| Spanned {
                node: expression,
                span: extra.span(),
            })
            .or(nested);

        let operations = atom.pratt((
            // `**` binds tightest and groups to the right.
            infix(right(8), just(Token::DoubleAsterisk), |l, _, r, extra| {
                binary(BinaryOperator::Power, l, r, extra.span())
            }),
            prefix(
                7,
                select! {
                    Token::Minus => UnaryOperator::Negate,
                    Token::Plus => UnaryOperator::Plus,
                    Token::Bang => UnaryOperator::Not,
                },
                |operator, operand, extra| unary(operator, operand, extra.span()),
            ),
            infix(
                left(6),
                select! {
                    Token::Asterisk => BinaryOperator::Multiply,
                    Token::Slash => BinaryOperator::Divide,
                    Token::Percent => BinaryOperator::Remainder,
                },
                |l, operator, r, extra| binary(operator, l, r, extra.span()),
            ),
            infix(
                left(5),
                select! {
                    Token::Plus => BinaryOperator::Add,
                    Token::Minus => BinaryOperator::Subtract,
                },
                |l, operator, r, extra| binary(operator, l, r, extra.span()),
            ),
            infix(
                left(4),
                select! {
                    Token::Less => BinaryOperator::Less,
                    Token::LessOrEqual => BinaryOperator::LessOrEqual,
                    Token::Greater => BinaryOperator::Greater,
                    Token::GreaterOrEqual => BinaryOperator::GreaterOrEqual,
                },
                |l, operator, r, extra| binary(operator, l, r, extra.span()),
            ),
            infix(
                left(3),
                select! {
                    Token::Equal => BinaryOperator::Equal,
                    Token::NotEqual => BinaryOperator::NotEqual,
                    Token::StrictEqual => BinaryOperator::StrictEqual,
                    Token::StrictNotEqual => BinaryOperator::StrictNotEqual,
                },
                |l, operator, r, extra| binary(operator, l, r, extra.span()),
            ),
            infix(left(2), just(Token::And), |l, _, r, extra| {
                binary(BinaryOperator::And, l, r, extra.span())
            }),
            infix(left(1), just(Token::Or), |l, _, r, extra| {
                binary(BinaryOperator::Or, l, r, extra.span())
            }),
        ));

        // Ternary sits below every binary operator and groups to the right.
        operations
            .then(
                just(Token::Question)
                    .ignore_then(expression.clone())
                    .then_ignore(just(Token::Colon))
                    .then(expression)
                    .or_not(),
            )
            .map_with(|(condition, branches), extra| match branches {
                Some((then, otherwise)) => Spanned {
                    span: extra.span(),
                    node: Expression::Conditional {
                        condition: Box::new(condition),
                        then: Box::new(then),
                        otherwise: Box::new(otherwise),
                    },
                },
                None => condition,
            })
    })
}

/// A parsed formula together with the identifiers it reads.
#[derive(Debug, Clone)]
pub struct Formula {
    text: String,
    root: Spanned<Expression>,
    references: IndexSet<String>,
}

impl Formula {
    pub fn compile(text: &str) -> Result<Self, FormulaError> {
        let (tokens, errors) = lexer().parse(text).into_output_errors();
        if !errors.is_empty() {
            return Err(formula_error(text, errors));
        }
        let Some(tokens) = tokens else {
            return Err(formula_error::<char>(text, Vec::new()));
        };

        let (root, errors) = parser()
            .then_ignore(end())
            .parse(
                tokens
                    .as_slice()
                    .map(Span::from(text.len()..text.len()), |Spanned { node, span }| (node, span)),
            )
            .into_output_errors();
        if !errors.is_empty() {
            return Err(formula_error(text, errors));
        }
        let Some(root) = root else {
            return Err(formula_error::<Token>(text, Vec::new()));
        };

        let references = collect_references(&root);
        Ok(Self {
            text: text.to_owned(),
            root,
            references,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Spanned<Expression> {
        &self.root
    }

    /// Identifiers read as variables, in first-use order. Called function
    /// names are not included.
    pub fn referenced_names(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(String::as_str)
    }

    pub fn references(&self, name: &str) -> bool {
        self.references.contains(name)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

const REPORT_SOURCE: &str = "formula";

fn formula_error<'code, T: fmt::Display + 'code>(
    text: &str,
    errors: Vec<ParseError<'code, T>>,
) -> FormulaError {
    if errors.is_empty() {
        return FormulaError {
            text: text.to_owned(),
            message: "empty formula".to_owned(),
            report: String::new(),
        };
    }
    let message = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    let mut report = Vec::new();
    for error in &errors {
        let written = Report::build(ReportKind::Error, (REPORT_SOURCE, error.span().into_range()))
            .with_config(Config::default().with_color(false))
            .with_message(error.to_string())
            .with_label(
                Label::new((REPORT_SOURCE, error.span().into_range()))
                    .with_message(error.reason().to_string()),
            )
            .finish()
            .write((REPORT_SOURCE, Source::from(text)), &mut report);
        if written.is_err() {
            break;
        }
    }
    FormulaError {
        text: text.to_owned(),
        message,
        report: String::from_utf8_lossy(&report).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(text: &str) -> Expression {
        Formula::compile(text).unwrap().root.node
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let Expression::Binary { operator, operand_b, .. } = compile("1 + 2 * 3") else {
            panic!("expected a binary expression");
        };
        assert_eq!(operator, BinaryOperator::Add);
        assert!(matches!(
            operand_b.node,
            Expression::Binary { operator: BinaryOperator::Multiply, .. }
        ));
    }

    #[test]
    fn power_groups_right() {
        let Expression::Binary { operator, operand_a, operand_b } = compile("2 ** 3 ** 2") else {
            panic!("expected a binary expression");
        };
        assert_eq!(operator, BinaryOperator::Power);
        assert!(matches!(operand_a.node, Expression::Literal(Literal::Number(n)) if n == 2.0));
        assert!(matches!(operand_b.node, Expression::Binary { operator: BinaryOperator::Power, .. }));
    }

    #[test]
    fn ternary_is_lowest_and_nests_right() {
        let Expression::Conditional { condition, otherwise, .. } =
            compile("a > 1 || b ? 'x' : c ? 'y' : 'z'")
        else {
            panic!("expected a conditional");
        };
        assert!(matches!(condition.node, Expression::Binary { operator: BinaryOperator::Or, .. }));
        assert!(matches!(otherwise.node, Expression::Conditional { .. }));
    }

    #[test]
    fn calls_and_references() {
        let formula = Formula::compile("sumValuesWithId('item') * multiplier + max(a, b)").unwrap();
        let names: Vec<_> = formula.referenced_names().collect();
        assert_eq!(names, vec!["multiplier", "a", "b"]);
        assert!(!formula.references("sumValuesWithId"));
    }

    #[test]
    fn spans_cover_source() {
        let formula = Formula::compile("price * qty").unwrap();
        assert_eq!(formula.root().span.into_range(), 0..11);
    }

    #[test]
    fn syntax_errors_are_reported() {
        for text in ["", "1 +", "(a", "a b", "price = 5", "alert(1);", "x.constructor"] {
            let error = Formula::compile(text).unwrap_err();
            assert_eq!(error.text, text);
            assert!(!error.message.is_empty(), "{text}");
        }
        let error = Formula::compile("1 + * 2").unwrap_err();
        assert!(error.report.contains("formula"), "{}", error.report);
    }
}
