//! Evaluates a compiled [`Formula`] against explicit [`Bindings`].
//! Nothing outside the bindings and the built-in functions is reachable.

use indexmap::IndexMap;

use crate::error::EvalError;
use crate::parser::{BinaryOperator, Expression, Formula, Literal, Spanned, UnaryOperator};
use crate::value::{Value, ops};

/// Name of the aggregate function bound by the context builder.
pub const SUM_VALUES_WITH_ID: &str = "sumValuesWithId";

pub type Aggregate<'a> = Box<dyn Fn(&str) -> f64 + 'a>;

/// Names visible to one evaluation.
#[derive(Default)]
pub struct Bindings<'a> {
    variables: IndexMap<String, Value>,
    sum_values_with_id: Option<Aggregate<'a>>,
}

impl<'a> Bindings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn with_sum_values_with_id(mut self, aggregate: impl Fn(&str) -> f64 + 'a) -> Self {
        self.sum_values_with_id = Some(Box::new(aggregate));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables.iter().map(|(name, value)| (name.as_str(), value))
    }
}

pub fn evaluate(formula: &Formula, bindings: &Bindings) -> Result<Value, EvalError> {
    evaluate_expression(formula.root(), bindings)
}

fn evaluate_expression(expression: &Spanned<Expression>, bindings: &Bindings) -> Result<Value, EvalError> {
    Ok(match &expression.node {
        Expression::Literal(Literal::Number(number)) => Value::Number(*number),
        Expression::Literal(Literal::Text(text)) => Value::Text(text.clone()),
        Expression::Literal(Literal::Bool(value)) => Value::Bool(*value),
        Expression::Variable(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownIdentifier(name.clone()))?,
        Expression::Call { name, arguments } => call(name, arguments, bindings)?,
        Expression::Unary { operator, operand } => {
            let operand = evaluate_expression(operand, bindings)?;
            match operator {
                UnaryOperator::Negate => ops::negate(&operand),
                UnaryOperator::Plus => Value::Number(operand.to_number()),
                UnaryOperator::Not => ops::not(&operand),
            }
        }
        Expression::Binary {
            operator: BinaryOperator::And,
            operand_a,
            operand_b,
        } => {
            let a = evaluate_expression(operand_a, bindings)?;
            if a.is_truthy() { evaluate_expression(operand_b, bindings)? } else { a }
        }
        Expression::Binary {
            operator: BinaryOperator::Or,
            operand_a,
            operand_b,
        } => {
            let a = evaluate_expression(operand_a, bindings)?;
            if a.is_truthy() { a } else { evaluate_expression(operand_b, bindings)? }
        }
        Expression::Binary {
            operator,
            operand_a,
            operand_b,
        } => {
            let a = evaluate_expression(operand_a, bindings)?;
            let b = evaluate_expression(operand_b, bindings)?;
            binary(*operator, &a, &b)
        }
        Expression::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if evaluate_expression(condition, bindings)?.is_truthy() {
                evaluate_expression(then, bindings)?
            } else {
                evaluate_expression(otherwise, bindings)?
            }
        }
    })
}

fn binary(operator: BinaryOperator, a: &Value, b: &Value) -> Value {
    match operator {
        BinaryOperator::Power => ops::power(a, b),
        BinaryOperator::Multiply => ops::multiply(a, b),
        BinaryOperator::Divide => ops::divide(a, b),
        BinaryOperator::Remainder => ops::remainder(a, b),
        BinaryOperator::Add => ops::add(a, b),
        BinaryOperator::Subtract => ops::subtract(a, b),
        BinaryOperator::Less => ops::less(a, b),
        BinaryOperator::LessOrEqual => ops::less_or_equal(a, b),
        BinaryOperator::Greater => ops::greater(a, b),
        BinaryOperator::GreaterOrEqual => ops::greater_or_equal(a, b),
        BinaryOperator::Equal => Value::Bool(ops::loose_equal(a, b)),
        BinaryOperator::NotEqual => Value::Bool(!ops::loose_equal(a, b)),
        BinaryOperator::StrictEqual => Value::Bool(ops::strict_equal(a, b)),
        BinaryOperator::StrictNotEqual => Value::Bool(!ops::strict_equal(a, b)),
        // Short-circuiting operators never reach here.
        BinaryOperator::And | BinaryOperator::Or => Value::Bool(false),
    }
}

fn call(name: &str, arguments: &[Spanned<Expression>], bindings: &Bindings) -> Result<Value, EvalError> {
    let arguments = arguments
        .iter()
        .map(|argument| evaluate_expression(argument, bindings))
        .collect::<Result<Vec<_>, _>>()?;

    let single = |name: &'static str| -> Result<f64, EvalError> {
        match arguments.as_slice() {
            [argument] => Ok(argument.to_number()),
            _ => Err(EvalError::Arity {
                name,
                expected: 1,
                actual: arguments.len(),
            }),
        }
    };

    Ok(Value::Number(match name {
        SUM_VALUES_WITH_ID => {
            let aggregate = bindings
                .sum_values_with_id
                .as_ref()
                .ok_or_else(|| EvalError::UnknownFunction(name.to_owned()))?;
            match arguments.as_slice() {
                [Value::Text(identifier)] => aggregate(identifier.as_str()),
                [_] => return Err(EvalError::InvalidArgument(SUM_VALUES_WITH_ID)),
                _ => {
                    return Err(EvalError::Arity {
                        name: SUM_VALUES_WITH_ID,
                        expected: 1,
                        actual: arguments.len(),
                    });
                }
            }
        }
        // Lists spread into their items.
        "min" => spread(&arguments).fold(f64::INFINITY, |min, item| {
            if min.is_nan() || item.is_nan() { f64::NAN } else { min.min(item) }
        }),
        "max" => spread(&arguments).fold(f64::NEG_INFINITY, |max, item| {
            if max.is_nan() || item.is_nan() { f64::NAN } else { max.max(item) }
        }),
        "abs" => single("abs")?.abs(),
        "round" => round_half_up(single("round")?),
        "floor" => single("floor")?.floor(),
        "ceil" => single("ceil")?.ceil(),
        _ => return Err(EvalError::UnknownFunction(name.to_owned())),
    }))
}

fn spread(arguments: &[Value]) -> impl Iterator<Item = f64> + '_ {
    arguments.iter().flat_map(|argument| match argument {
        Value::List(items) => items.clone(),
        other => vec![other.to_number()],
    })
}

/// `Math.round`: ties go towards positive infinity.
fn round_half_up(number: f64) -> f64 {
    let rounded = number.round();
    if number < 0.0 && rounded - number == -0.5 {
        rounded + 1.0
    } else {
        rounded
    }
}
