use indexmap::IndexSet;

use super::{Expression, Spanned};

/// Variable names read by an expression, in first-use order.
pub fn collect_references(root: &Spanned<Expression>) -> IndexSet<String> {
    let mut references = IndexSet::new();
    visit(root, &mut references);
    references
}

fn visit(expression: &Spanned<Expression>, references: &mut IndexSet<String>) {
    match &expression.node {
        Expression::Literal(_) => {}
        Expression::Variable(name) => {
            if !references.contains(name) {
                references.insert(name.clone());
            }
        }
        Expression::Call { arguments, .. } => {
            for argument in arguments {
                visit(argument, references);
            }
        }
        Expression::Unary { operand, .. } => visit(operand, references),
        Expression::Binary {
            operand_a,
            operand_b,
            ..
        } => {
            visit(operand_a, references);
            visit(operand_b, references);
        }
        Expression::Conditional {
            condition,
            then,
            otherwise,
        } => {
            visit(condition, references);
            visit(then, references);
            visit(otherwise, references);
        }
    }
}
