use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a symbol as it appears in a matrix cell: `±s` or `±s*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SymbolExpression {
    pub id: usize,
    pub conjugated: bool,
    pub negated: bool,
}

impl SymbolExpression {
    #[inline]
    pub const fn new(id: usize, conjugated: bool) -> Self {
        Self {
            id,
            conjugated,
            negated: false,
        }
    }

    /// The zero symbol.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0, false)
    }

    /// This expression with the conjugation flag flipped.
    #[inline]
    pub const fn conjugate(self) -> Self {
        Self {
            conjugated: !self.conjugated,
            ..self
        }
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.id == 0
    }
}

impl fmt::Display for SymbolExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("-")?;
        }
        write!(f, "{}", self.id)?;
        if self.conjugated {
            f.write_str("*")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(SymbolExpression::new(3, false).to_string(), "3");
        assert_eq!(SymbolExpression::new(5, true).to_string(), "5*");
        let negated = SymbolExpression {
            negated: true,
            ..SymbolExpression::new(3, false)
        };
        assert_eq!(negated.to_string(), "-3");
        assert_eq!(SymbolExpression::new(2, false).conjugate(), SymbolExpression::new(2, true));
    }
}
