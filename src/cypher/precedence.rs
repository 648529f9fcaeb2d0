//! Expression precedence table.
//!
//! Levels are numbered outermost (11, `OR`) to innermost (1, atoms). Only
//! the plain binary levels live in the table; the prefix `NOT` stack (8),
//! the comparison / predicate suffix level (7), unary sign (3), postfix (2)
//! and atoms (1) have their own shape and are hand-written in the
//! expression parser. The table is built once per process and only read.

use std::sync::LazyLock;

use super::ast::BinaryOp;
use super::lexer::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// One binary precedence level.
#[derive(Debug)]
pub struct Level {
    pub number: u8,
    pub name: &'static str,
    pub operators: &'static [(TokenKind, BinaryOp)],
    pub assoc: Assoc,
}

impl Level {
    pub fn operator(&self, kind: TokenKind) -> Option<BinaryOp> {
        self.operators.iter().find(|(k, _)| *k == kind).map(|(_, op)| *op)
    }
}

pub struct PrecedenceTable {
    levels: Vec<Level>,
}

impl PrecedenceTable {
    fn build() -> Self {
        let levels = vec![
            Level { number: 11, name: "OR expression", operators: &[(TokenKind::Or, BinaryOp::Or)], assoc: Assoc::Left },
            Level { number: 10, name: "XOR expression", operators: &[(TokenKind::Xor, BinaryOp::Xor)], assoc: Assoc::Left },
            Level { number: 9, name: "AND expression", operators: &[(TokenKind::And, BinaryOp::And)], assoc: Assoc::Left },
            Level {
                number: 6,
                name: "additive expression",
                operators: &[
                    (TokenKind::Plus, BinaryOp::Add),
                    (TokenKind::Minus, BinaryOp::Sub),
                    (TokenKind::DoublePipe, BinaryOp::Concat),
                ],
                assoc: Assoc::Left,
            },
            Level {
                number: 5,
                name: "multiplicative expression",
                operators: &[
                    (TokenKind::Star, BinaryOp::Mul),
                    (TokenKind::Slash, BinaryOp::Div),
                    (TokenKind::Percent, BinaryOp::Mod),
                ],
                assoc: Assoc::Left,
            },
            // `^` is left-associative in this grammar: 2^3^2 = (2^3)^2
            Level { number: 4, name: "power expression", operators: &[(TokenKind::Caret, BinaryOp::Pow)], assoc: Assoc::Left },
        ];
        Self { levels }
    }

    /// Binary level by position, outermost first.
    pub fn at(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    /// Precedence number of a binary operator. Comparisons share level 7.
    pub fn precedence_of(&self, op: BinaryOp) -> u8 {
        if op.is_comparison() {
            return 7;
        }
        self.levels
            .iter()
            .find(|l| l.operators.iter().any(|(_, o)| *o == op))
            .map(|l| l.number)
            .unwrap_or(7)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }
}

/// Index of the `OR` level in [`PrecedenceTable::levels`].
pub const OR_LEVEL: usize = 0;
/// Index of the additive level, the first below the comparison levels.
pub const ADDITIVE_LEVEL: usize = 3;

pub static PRECEDENCE: LazyLock<PrecedenceTable> = LazyLock::new(PrecedenceTable::build);

/// Comparison operators, parsed as a chain between levels 8 and 7.
pub const COMPARISON_OPERATORS: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Eq, BinaryOp::Eq),
    (TokenKind::Neq, BinaryOp::Neq),
    (TokenKind::Lt, BinaryOp::Lt),
    (TokenKind::Lte, BinaryOp::Lte),
    (TokenKind::Gt, BinaryOp::Gt),
    (TokenKind::Gte, BinaryOp::Gte),
];

pub fn comparison_operator(kind: TokenKind) -> Option<BinaryOp> {
    COMPARISON_OPERATORS.iter().find(|(k, _)| *k == kind).map(|(_, op)| *op)
}
