//! Built-in color table.

use std::fmt;

use crate::input::ColorRequest;
use crate::source::ColorSource;

/// A named color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub name: &'static str,
    pub hex: &'static str,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.hex)
    }
}

/// The fixed palette served by [`StaticPalette::default`].
pub const DEFAULT_PALETTE: &[Color] = &[
    Color { name: "Coral Red", hex: "#FF6B6B" },
    Color { name: "Turquoise", hex: "#4ECDC4" },
    Color { name: "Sky Blue", hex: "#45B7D1" },
    Color { name: "Sage Green", hex: "#96CEB4" },
    Color { name: "Soft Yellow", hex: "#FFEAA7" },
];

/// Serves colors from a fixed table, independent of mood.
#[derive(Debug, Clone)]
pub struct StaticPalette {
    colors: &'static [Color],
}

impl StaticPalette {
    pub fn new(colors: &'static [Color]) -> Self {
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The first `count` colors, or the whole table if it is shorter.
    pub fn pick(&self, count: u32) -> &[Color] {
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        &self.colors[..count.min(self.colors.len())]
    }

    pub fn render(&self, request: &ColorRequest) -> String {
        let lines = self
            .pick(request.count)
            .iter()
            .map(Color::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        format!("Colors for {} mood:\n{lines}", request.mood)
    }
}

impl Default for StaticPalette {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE)
    }
}

impl ColorSource for StaticPalette {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn colors(&self, request: &ColorRequest) -> String {
        self.render(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_with_one_color() {
        let text = StaticPalette::default().render(&ColorRequest::new("happy", 1));
        assert_eq!(text, "Colors for happy mood:\nCoral Red (#FF6B6B)");
    }

    #[test]
    fn returns_min_of_count_and_table_size_in_order() {
        let palette = StaticPalette::default();
        for count in 1..=12u32 {
            let picked = palette.pick(count);
            assert_eq!(picked.len(), (count as usize).min(palette.len()));
            assert_eq!(picked, &DEFAULT_PALETTE[..picked.len()]);
        }
    }

    #[test]
    fn huge_count_returns_whole_table() {
        let text = StaticPalette::default().render(&ColorRequest::new("calm", u32::MAX));
        assert_eq!(text.lines().count(), DEFAULT_PALETTE.len() + 1);
        assert!(text.ends_with("Soft Yellow (#FFEAA7)"));
    }
}
