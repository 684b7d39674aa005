use crate::chain::types::Balance;

/// `floor(a * b / c)`, or `None` on overflow or a zero divisor.
pub fn multiply_by_rational(a: Balance, b: Balance, c: Balance) -> Option<Balance> {
    if c == 0 {
        return None;
    }
    if let Some(product) = a.checked_mul(b) {
        return Some(product / c);
    }
    // floor(a*b/c) == (a/c)*b + floor((a%c)*b/c)
    let whole = (a / c).checked_mul(b)?;
    let part = (a % c).checked_mul(b)? / c;
    whole.checked_add(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates() {
        assert_eq!(multiply_by_rational(3, 3, 2), Some(4));
        assert_eq!(multiply_by_rational(10, 1, 3), Some(3));
        assert_eq!(multiply_by_rational(1, 1, 0), None);
    }

    #[test]
    fn test_large_operands() {
        let a = u128::MAX / 4;
        assert_eq!(multiply_by_rational(a, 8, 8), Some(a));
        assert_eq!(multiply_by_rational(u128::MAX, 2, 1), None);
    }
}
