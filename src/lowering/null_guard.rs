//! Collapses `x != null ? e : null` (and `x == null ? null : e`) to `e`.
//!
//! Only the provably safe shape is rewritten: the test compares one operand
//! against a null literal, exactly one branch is the null literal, and the
//! other branch reads through the tested operand. Anything else is left for
//! translation to reject.

use crate::error::Result;
use crate::expr::{BinaryOp, Expr};
use crate::lowering::{PassContext, rewrite_nodes};

pub(crate) fn apply(expr: Expr, _ctx: &PassContext) -> Result<Expr> {
    rewrite_nodes(expr, |node| Ok(rewrite(node)))
}

fn rewrite(node: Expr) -> Expr {
    match node {
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => match guarded_branch(&test, &if_true, &if_false) {
            Some(true) => *if_true,
            Some(false) => *if_false,
            None => Expr::Conditional {
                test,
                if_true,
                if_false,
            },
        },
        other => other,
    }
}

/// Which branch survives, if the conditional is a null guard.
fn guarded_branch(test: &Expr, if_true: &Expr, if_false: &Expr) -> Option<bool> {
    let Expr::Binary { op, left, right } = test else {
        return None;
    };
    let subject = match (left.is_null_constant(), right.is_null_constant()) {
        (false, true) => &**left,
        (true, false) => &**right,
        _ => return None,
    };
    let (keep_true, value, null_branch) = match op {
        BinaryOp::NotEqual => (true, if_true, if_false),
        BinaryOp::Equal => (false, if_false, if_true),
        _ => return None,
    };
    if !null_branch.is_null_constant() || value.is_null_constant() {
        return None;
    }
    shares_root(value, subject).then_some(keep_true)
}

/// True if `value` reads through `subject`.
fn shares_root(value: &Expr, subject: &Expr) -> bool {
    match subject {
        Expr::Field(root) => {
            let nested = format!("{}.", root.name);
            value.contains(&|e| match e {
                Expr::Field(field) => field.name == root.name || field.name.starts_with(&nested),
                _ => false,
            })
        }
        subject => value.contains(&|e| e == subject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ScalarKind;
    use crate::lowering::Role;

    const CTX: PassContext = PassContext {
        role: Role::Predicate,
    };

    fn author() -> Expr {
        Expr::field("author", ScalarKind::Other)
    }

    fn author_name() -> Expr {
        Expr::field("author.name", ScalarKind::Text)
    }

    #[test]
    fn test_not_null_guard_collapses() {
        let expr = Expr::conditional(author().not_equal(Expr::null()), author_name(), Expr::null());
        assert_eq!(apply(expr, &CTX).unwrap(), author_name());
    }

    #[test]
    fn test_is_null_guard_collapses() {
        let expr = Expr::conditional(Expr::null().equal(author()), Expr::null(), author_name());
        assert_eq!(apply(expr, &CTX).unwrap(), author_name());
    }

    #[test]
    fn test_ambiguous_shapes_are_untouched() {
        // Both branches non-null.
        let both = Expr::conditional(
            author().not_equal(Expr::null()),
            author_name(),
            Expr::constant("anonymous"),
        );
        assert_eq!(apply(both.clone(), &CTX).unwrap(), both);

        // Guarded value does not read through the tested reference.
        let unrelated = Expr::conditional(
            author().not_equal(Expr::null()),
            Expr::field("title", ScalarKind::Text),
            Expr::null(),
        );
        assert_eq!(apply(unrelated.clone(), &CTX).unwrap(), unrelated);

        // Null on both sides of the test.
        let degenerate = Expr::conditional(
            Expr::null().equal(Expr::null()),
            Expr::null(),
            author_name(),
        );
        assert_eq!(apply(degenerate.clone(), &CTX).unwrap(), degenerate);
    }
}
