//! Mana costs and production

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// Mana colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    /// All six color positions in canonical WUBRGC order
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Colorless,
    ];

    /// Canonical index of this color (W=0 .. C=5)
    pub fn index(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Blue => 1,
            Color::Black => 2,
            Color::Red => 3,
            Color::Green => 4,
            Color::Colorless => 5,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "W"),
            Color::Blue => write!(f, "U"),
            Color::Black => write!(f, "B"),
            Color::Red => write!(f, "R"),
            Color::Green => write!(f, "G"),
            Color::Colorless => write!(f, "C"),
        }
    }
}

/// Represents a mana cost (e.g., "3GG" = 3 generic + 2 green)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u8,
    pub white: u8,
    pub blue: u8,
    pub black: u8,
    pub red: u8,
    pub green: u8,
    pub colorless: u8,
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a cost string like "3GG" or "WUBRG"
    ///
    /// Digits accumulate into the generic component (so "10R" reads as ten
    /// generic plus one red); unknown symbols are skipped.
    pub fn from_string(s: &str) -> Self {
        let mut cost = ManaCost::new();
        for symbol in s.chars() {
            if let Some(digit) = symbol.to_digit(10) {
                cost.generic = cost.generic.saturating_mul(10).saturating_add(digit as u8);
                continue;
            }
            match symbol {
                'W' => cost.white += 1,
                'U' => cost.blue += 1,
                'B' => cost.black += 1,
                'R' => cost.red += 1,
                'G' => cost.green += 1,
                'C' => cost.colorless += 1,
                _ => {}
            }
        }
        cost
    }

    /// Total converted mana cost
    pub fn cmc(&self) -> u8 {
        self.generic
            + self.white
            + self.blue
            + self.black
            + self.red
            + self.green
            + self.colorless
    }

    /// Number of colored pips of the given color in this cost
    pub fn pips(&self, color: Color) -> u8 {
        match color {
            Color::White => self.white,
            Color::Blue => self.blue,
            Color::Black => self.black,
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Colorless => self.colorless,
        }
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic > 0 {
            write!(f, "{}", self.generic)?;
        }
        let pips = [
            ('W', self.white),
            ('U', self.blue),
            ('B', self.black),
            ('R', self.red),
            ('G', self.green),
            ('C', self.colorless),
        ];
        for (symbol, count) in pips {
            for _ in 0..count {
                f.write_char(symbol)?;
            }
        }
        Ok(())
    }
}

/// What a permanent's mana abilities can produce
///
/// Kept as a compact summary (amount per color position plus any activation
/// cost) so the evaluator can score mana bases without walking ability
/// objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaProduction {
    /// Mana produced per activation, per color position (WUBRGC)
    pub produces: [u8; 6],

    /// Converted cost of activating the ability (beyond tapping)
    pub activation_cost: u8,
}

impl ManaProduction {
    /// A basic source producing one mana of the given color
    pub fn single(color: Color) -> Self {
        let mut produces = [0u8; 6];
        produces[color.index()] = 1;
        ManaProduction {
            produces,
            activation_cost: 0,
        }
    }

    /// Total mana produced per activation
    pub fn total(&self) -> u8 {
        self.produces.iter().sum()
    }

    /// Mana produced net of the activation cost
    pub fn net(&self) -> i32 {
        self.total() as i32 - self.activation_cost as i32
    }

    /// Number of distinct colors this source can produce
    pub fn distinct_colors(&self) -> usize {
        self.produces.iter().filter(|&&n| n > 0).count()
    }

    pub fn produces_color(&self, color: Color) -> bool {
        self.produces[color.index()] > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_costs() {
        let cost = ManaCost::from_string("3GG");
        assert_eq!(cost.generic, 3);
        assert_eq!(cost.green, 2);
        assert_eq!(cost.cmc(), 5);

        let rainbow = ManaCost::from_string("WUBRG");
        assert_eq!(rainbow.generic, 0);
        assert_eq!(rainbow.cmc(), 5);
        for color in [Color::White, Color::Blue, Color::Black, Color::Red, Color::Green] {
            assert_eq!(rainbow.pips(color), 1);
        }

        // Multi-digit generic components accumulate positionally
        let big = ManaCost::from_string("10R");
        assert_eq!(big.generic, 10);
        assert_eq!(big.red, 1);
        assert_eq!(big.cmc(), 11);
    }

    #[test]
    fn test_mana_production() {
        let forest = ManaProduction::single(Color::Green);
        assert_eq!(forest.total(), 1);
        assert_eq!(forest.net(), 1);
        assert_eq!(forest.distinct_colors(), 1);
        assert!(forest.produces_color(Color::Green));
        assert!(!forest.produces_color(Color::Red));
    }

    #[test]
    fn test_display_round_trips_canonical_strings() {
        for s in ["3GG", "WUBRG", "10R", "2C"] {
            assert_eq!(ManaCost::from_string(s).to_string(), s);
        }
        assert_eq!(ManaCost::new().to_string(), "");
    }
}
