//! Expression simplifier (C4): a right-to-left stack machine over the
//! flattened-preorder token list. Ported statement-for-statement from the
//! reference linker's `simplify()`, including its exact operand order for
//! non-commutative folds (the deeper stack item is always the left-hand
//! operand of the literal fold formula, whichever tree side it came from).

use sn_model::{BinOp, Expr};

/// Simplify a relocation expression in place. Division/modulo by zero yield
/// 0. Returns `true` if any reduction happened.
pub fn simplify(expr: &mut Vec<Expr>) -> bool {
    if expr.len() <= 1 {
        return false;
    }

    let mut out: Vec<Expr> = Vec::with_capacity(expr.len());

    for &tok in expr.iter().rev() {
        let Expr::BinOp(op) = tok else {
            out.push(tok);
            continue;
        };

        if out.len() < 2 {
            continue;
        }
        let b = out[out.len() - 1];
        let a = out[out.len() - 2];

        if let (Some(av), Some(bv)) = (a.as_const(), b.as_const()) {
            out.pop();
            out.pop();
            out.push(Expr::Const(op.apply(av, bv)));
            continue;
        }

        if let (Some((seg, aoff)), Some(bv), BinOp::Add) = (a.as_omf(), b.as_const(), op) {
            out.pop();
            out.pop();
            out.push(Expr::Omf {
                segment: seg,
                offset: aoff.wrapping_add(bv),
            });
            continue;
        }

        if let (Some((seg, aoff)), Some(bv), BinOp::Sub) = (a.as_omf(), b.as_const(), op) {
            out.pop();
            out.pop();
            out.push(Expr::Omf {
                segment: seg,
                offset: aoff.wrapping_sub(bv),
            });
            continue;
        }

        if let (Some(av), Some((seg, boff)), BinOp::Add) = (a.as_const(), b.as_omf(), op) {
            out.pop();
            out.pop();
            out.push(Expr::Omf {
                segment: seg,
                offset: boff.wrapping_add(av),
            });
            continue;
        }

        if let (Some((aseg, aoff)), Some((bseg, boff)), BinOp::Sub) = (a.as_omf(), b.as_omf(), op) {
            if aseg == bseg {
                out.pop();
                out.pop();
                out.push(Expr::Const(aoff.wrapping_sub(boff)));
                continue;
            }
        }

        out.push(tok);
    }

    if out.len() == expr.len() {
        return false;
    }
    out.reverse();
    *expr = out;
    true
}

/// Truncation-strip pass: `AND CONST<mask> <rest>` where the relocation's
/// declared width matches the mask makes the explicit mask redundant, since
/// OMF truncates at emit time anyway. Strips the leading two tokens and
/// reports whether a `*Warn` type should be downgraded.
pub fn strip_truncation(expr: &mut Vec<Expr>, width: u8) -> bool {
    if expr.len() < 2 {
        return false;
    }
    let Expr::BinOp(BinOp::And) = expr[0] else {
        return false;
    };
    let Some(mask) = expr[1].as_const() else {
        return false;
    };
    let expected = match width {
        1 => 0xff,
        2 => 0xffff,
        3 => 0xffffff,
        4 => 0xffffffff,
        _ => return false,
    };
    if mask != expected {
        return false;
    }
    expr.drain(0..2);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_constant_chain() {
        // preorder for (1 + 2) -> [+, 1, 2]
        let mut e = vec![Expr::BinOp(BinOp::Add), Expr::Const(1), Expr::Const(2)];
        assert!(simplify(&mut e));
        assert_eq!(e, vec![Expr::Const(3)]);
    }

    #[test]
    fn division_by_zero_yields_zero() {
        let mut e = vec![Expr::BinOp(BinOp::Div), Expr::Const(5), Expr::Const(0)];
        simplify(&mut e);
        assert_eq!(e, vec![Expr::Const(0)]);
    }

    #[test]
    fn omf_plus_const_folds_offset() {
        let mut e = vec![
            Expr::BinOp(BinOp::Add),
            Expr::Omf { segment: 3, offset: 0x100 },
            Expr::Const(4),
        ];
        assert!(simplify(&mut e));
        assert_eq!(e, vec![Expr::Omf { segment: 3, offset: 0x104 }]);
    }

    #[test]
    fn same_segment_subtraction_becomes_const() {
        let mut e = vec![
            Expr::BinOp(BinOp::Sub),
            Expr::Omf { segment: 1, offset: 0x200 },
            Expr::Omf { segment: 1, offset: 0x100 },
        ];
        assert!(simplify(&mut e));
        assert_eq!(e, vec![Expr::Const(0x100)]);
    }

    #[test]
    fn different_segment_subtraction_is_left_unresolved() {
        let mut e = vec![
            Expr::BinOp(BinOp::Sub),
            Expr::Omf { segment: 1, offset: 0x200 },
            Expr::Omf { segment: 2, offset: 0x100 },
        ];
        assert!(!simplify(&mut e));
    }

    #[test]
    fn unreducible_expression_is_unchanged() {
        let mut e = vec![Expr::BinOp(BinOp::Add), Expr::Extern(1), Expr::Const(2)];
        let before = e.clone();
        assert!(!simplify(&mut e));
        assert_eq!(e, before);
    }

    #[test]
    fn is_idempotent() {
        let mut e = vec![
            Expr::BinOp(BinOp::Add),
            Expr::BinOp(BinOp::Mul),
            Expr::Const(2),
            Expr::Const(3),
            Expr::Const(1),
        ];
        simplify(&mut e);
        let once = e.clone();
        simplify(&mut e);
        assert_eq!(e, once);
    }

    #[test]
    fn strip_truncation_matches_width() {
        let mut e = vec![
            Expr::BinOp(BinOp::And),
            Expr::Const(0xff),
            Expr::Omf { segment: 1, offset: 0x100 },
        ];
        assert!(strip_truncation(&mut e, 1));
        assert_eq!(e, vec![Expr::Omf { segment: 1, offset: 0x100 }]);
    }

    #[test]
    fn strip_truncation_rejects_mismatched_width() {
        let mut e = vec![
            Expr::BinOp(BinOp::And),
            Expr::Const(0xff),
            Expr::Omf { segment: 1, offset: 0x100 },
        ];
        assert!(!strip_truncation(&mut e, 2));
    }
}
