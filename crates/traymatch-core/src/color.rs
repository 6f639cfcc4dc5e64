//! The closed set of item colors.

use std::fmt;

/// Color of an item and home color of a container.
///
/// The set is closed: level data can only reference these seven members.
/// `Ord` follows declaration order so that color-keyed maps iterate
/// deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    /// Red.
    Red,
    /// Blue.
    Blue,
    /// Green.
    Green,
    /// Yellow.
    Yellow,
    /// Purple.
    Purple,
    /// Orange.
    Orange,
    /// Pink.
    Pink,
}

impl Color {
    /// Every color, in declaration order.
    pub const ALL: [Color; 7] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Purple,
        Color::Orange,
        Color::Pink,
    ];

    /// Lower-case name used in logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Pink => "pink",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_colors_are_distinct() {
        let set: HashSet<Color> = Color::ALL.into_iter().collect();
        assert_eq!(set.len(), 7);
    }

    #[test]
    fn ordering_follows_declaration() {
        let mut sorted = Color::ALL;
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted, Color::ALL);
    }

    #[test]
    fn display_uses_lowercase_name() {
        assert_eq!(Color::Purple.to_string(), "purple");
    }
}
