use super::{ParseError, Spanned};
use chumsky::prelude::*;
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'code> {
    BracketRoundOpen,
    BracketRoundClose,
    Comma,
    Question,
    Colon,
    Number(f64),
    Text(&'code str),
    Identifier(&'code str),
    True,
    False,
    Plus,
    Minus,
    Asterisk,
    DoubleAsterisk,
    Slash,
    Percent,
    Bang,
    And,
    Or,
    StrictEqual,
    StrictNotEqual,
    Equal,
    NotEqual,
    GreaterOrEqual,
    Greater,
    LessOrEqual,
    Less,
}

impl<'code> Token<'code> {
    pub fn into_cow_str(self) -> Cow<'code, str> {
        match self {
            Self::BracketRoundOpen => "(".into(),
            Self::BracketRoundClose => ")".into(),
            Self::Comma => ",".into(),
            Self::Question => "?".into(),
            Self::Colon => ":".into(),
            Self::Number(number) => number.to_string().into(),
            Self::Text(text) => format!("'{text}'").into(),
            Self::Identifier(identifier) => identifier.into(),
            Self::True => "true".into(),
            Self::False => "false".into(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Asterisk => "*".into(),
            Self::DoubleAsterisk => "**".into(),
            Self::Slash => "/".into(),
            Self::Percent => "%".into(),
            Self::Bang => "!".into(),
            Self::And => "&&".into(),
            Self::Or => "||".into(),
            Self::StrictEqual => "===".into(),
            Self::StrictNotEqual => "!==".into(),
            Self::Equal => "==".into(),
            Self::NotEqual => "!=".into(),
            Self::GreaterOrEqual => ">=".into(),
            Self::Greater => ">".into(),
            Self::LessOrEqual => "<=".into(),
            Self::Less => "<".into(),
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.into_cow_str())
    }
}

pub fn lexer<'code>()
-> impl Parser<'code, &'code str, Vec<Spanned<Token<'code>>>, extra::Err<ParseError<'code, char>>> {
    let bracket = choice((
        just('(').to(Token::BracketRoundOpen),
        just(')').to(Token::BracketRoundClose),
    ));

    // Longest operators first.
    let comparator = choice((
        just("===").to(Token::StrictEqual),
        just("!==").to(Token::StrictNotEqual),
        just("==").to(Token::Equal),
        just("!=").to(Token::NotEqual),
        just(">=").to(Token::GreaterOrEqual),
        just('>').to(Token::Greater),
        just("<=").to(Token::LessOrEqual),
        just('<').to(Token::Less),
    ));

    let logical_operator = choice((
        just("&&").to(Token::And),
        just("||").to(Token::Or),
        just('!').to(Token::Bang),
    ));

    let arithmetic_operator = choice((
        just("**").to(Token::DoubleAsterisk),
        just('*').to(Token::Asterisk),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
    ));

    let exponent = one_of("eE")
        .then(one_of("+-").or_not())
        .then(text::digits(10));

    // Signs are prefix operators, so `-5` lexes as Minus, Number.
    let number = choice((
        text::digits(10)
            .then(just('.').then(text::digits(10).or_not()).or_not())
            .ignored(),
        just('.').then(text::digits(10)).ignored(),
    ))
    .then(exponent.or_not())
    .to_slice()
    .try_map(|number: &str, span| {
        number
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|error| ParseError::custom(span, format!("Invalid number '{number}': {error}")))
    });

    let text = choice((
        just('\'')
            .ignore_then(none_of('\'').repeated().to_slice())
            .then_ignore(just('\'')),
        just('"')
            .ignore_then(none_of('"').repeated().to_slice())
            .then_ignore(just('"')),
    ))
    .map(Token::Text);

    let word = any()
        .filter(|character: &char| {
            character.is_ascii_alphabetic() || *character == '_' || *character == '$'
        })
        .then(
            any()
                .filter(|character: &char| {
                    character.is_ascii_alphanumeric() || *character == '_' || *character == '$'
                })
                .repeated(),
        )
        .to_slice()
        .map(|word| match word {
            "true" => Token::True,
            "false" => Token::False,
            identifier => Token::Identifier(identifier),
        });

    let token = choice((
        bracket,
        number,
        text,
        word,
        comparator,
        logical_operator,
        arithmetic_operator,
        just(',').to(Token::Comma),
        just('?').to(Token::Question),
        just(':').to(Token::Colon),
    ));

    token
        .map_with(|token, extra| Spanned {
            node: token,
            span: extra.span(),
        })
        .padded()
        .repeated()
        .collect::<Vec<_>>()
        .then_ignore(end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(code: &str) -> Vec<Token<'_>> {
        lexer()
            .parse(code)
            .into_result()
            .unwrap()
            .into_iter()
            .map(|token| token.node)
            .collect()
    }

    #[test]
    fn operators_prefer_longest_match() {
        assert_eq!(
            tokens("a === b !== c ** 2"),
            vec![
                Token::Identifier("a"),
                Token::StrictEqual,
                Token::Identifier("b"),
                Token::StrictNotEqual,
                Token::Identifier("c"),
                Token::DoubleAsterisk,
                Token::Number(2.0),
            ]
        );
    }

    #[test]
    fn number_forms() {
        assert_eq!(tokens("12"), vec![Token::Number(12.0)]);
        assert_eq!(tokens(".5"), vec![Token::Number(0.5)]);
        assert_eq!(tokens("1."), vec![Token::Number(1.0)]);
        assert_eq!(tokens("1.23e-4"), vec![Token::Number(1.23e-4)]);
        assert_eq!(tokens("-3"), vec![Token::Minus, Token::Number(3.0)]);
    }

    #[test]
    fn words_and_text() {
        assert_eq!(
            tokens("$total_2 ? 'Active' : \"Inactive\""),
            vec![
                Token::Identifier("$total_2"),
                Token::Question,
                Token::Text("Active"),
                Token::Colon,
                Token::Text("Inactive"),
            ]
        );
        assert_eq!(tokens("true false"), vec![Token::True, Token::False]);
    }

    #[test]
    fn rejects_unknown_characters() {
        assert!(lexer().parse("a; b").has_errors());
        assert!(lexer().parse("price = 1").has_errors());
        assert!(lexer().parse("obj.field").has_errors());
    }
}
