//! Position hints using logos
//!
//! Hints are short phrases such as `left`, `south_center`, `top-left` or
//! "park on the left side". The lexer picks out direction words and treats
//! everything else as filler.

use std::fmt;

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\n\r\-_,.;:/]+")]
pub enum HintToken {
    #[token("left")]
    #[token("west")]
    Left,

    #[token("right")]
    #[token("east")]
    Right,

    #[token("top")]
    #[token("north")]
    #[token("upper")]
    #[token("back")]
    Top,

    #[token("bottom")]
    #[token("south")]
    #[token("lower")]
    #[token("front")]
    Bottom,

    #[token("center")]
    #[token("centre")]
    #[token("centered")]
    #[token("central")]
    #[token("middle")]
    Center,

    // Filler words - must come after direction words
    #[regex(r"[a-z0-9']+", priority = 1)]
    Word,
}

/// Lex a lowercase hint into tokens, dropping anything the lexer rejects
pub fn lex(input: &str) -> impl Iterator<Item = HintToken> + '_ {
    HintToken::lexer(input).filter_map(|tok| tok.ok())
}

/// Horizontal anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HAlign {
    Left,
    Center,
    Right,
}

/// Vertical anchor (`Top` is the north edge, y = 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

/// Where on the plot an element wants to sit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub horizontal: HAlign,
    pub vertical: VAlign,
}

impl Anchor {
    pub fn new(horizontal: HAlign, vertical: VAlign) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = match self.horizontal {
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
        };
        let v = match self.vertical {
            VAlign::Top => "top",
            VAlign::Center => "center",
            VAlign::Bottom => "bottom",
        };
        match (self.horizontal, self.vertical) {
            (HAlign::Center, VAlign::Center) => write!(f, "center"),
            (_, VAlign::Center) => write!(f, "{}", h),
            (HAlign::Center, _) => write!(f, "{}", v),
            _ => write!(f, "{}_{}", v, h),
        }
    }
}

/// A parsed position hint
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Position {
    /// No preference
    #[default]
    Unspecified,
    /// Hint made only of direction words
    Token(Anchor),
    /// Anything else; resolved best-effort, advisory only
    FreeText {
        text: String,
        anchor: Option<Anchor>,
    },
}

impl Position {
    /// Parse an optional hint string. Never fails.
    pub fn parse(hint: Option<&str>) -> Self {
        let text = match hint.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Position::Unspecified,
        };
        let lowered = text.to_lowercase();

        let mut horizontal: Option<HAlign> = None;
        let mut vertical: Option<VAlign> = None;
        let mut centered = false;
        let mut filler = false;
        let mut contradictory = false;

        for token in lex(&lowered) {
            match token {
                HintToken::Left => contradictory |= set_axis(&mut horizontal, HAlign::Left),
                HintToken::Right => contradictory |= set_axis(&mut horizontal, HAlign::Right),
                HintToken::Top => contradictory |= set_axis(&mut vertical, VAlign::Top),
                HintToken::Bottom => contradictory |= set_axis(&mut vertical, VAlign::Bottom),
                HintToken::Center => centered = true,
                HintToken::Word => filler = true,
            }
        }

        let directional = horizontal.is_some() || vertical.is_some() || centered;
        let anchor = (directional && !contradictory).then(|| {
            Anchor::new(
                horizontal.unwrap_or(HAlign::Center),
                vertical.unwrap_or(VAlign::Center),
            )
        });

        match anchor {
            Some(anchor) if !filler => Position::Token(anchor),
            anchor => Position::FreeText {
                text: text.to_string(),
                anchor,
            },
        }
    }

    /// The anchor this hint resolves to, if any
    pub fn anchor(&self) -> Option<Anchor> {
        match self {
            Position::Unspecified => None,
            Position::Token(anchor) => Some(*anchor),
            Position::FreeText { anchor, .. } => *anchor,
        }
    }

    /// Whether any hint was given at all
    pub fn is_specified(&self) -> bool {
        !matches!(self, Position::Unspecified)
    }

    /// Whether the hint is a recognized token rather than free text
    pub fn is_recognized(&self) -> bool {
        matches!(self, Position::Token(_))
    }
}

/// Returns true when the axis was already set to a different value
fn set_axis<T: PartialEq + Copy>(axis: &mut Option<T>, value: T) -> bool {
    match axis {
        Some(existing) if *existing != value => true,
        _ => {
            *axis = Some(value);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_tokens() {
        let tokens: Vec<_> = lex("left west right east").collect();
        assert_eq!(
            tokens,
            vec![
                HintToken::Left,
                HintToken::Left,
                HintToken::Right,
                HintToken::Right
            ]
        );
    }

    #[test]
    fn test_separators_are_skipped() {
        let tokens: Vec<_> = lex("south_center top-left").collect();
        assert_eq!(
            tokens,
            vec![
                HintToken::Bottom,
                HintToken::Center,
                HintToken::Top,
                HintToken::Left
            ]
        );
    }

    #[test]
    fn test_longer_words_are_filler() {
        let tokens: Vec<_> = lex("leftover").collect();
        assert_eq!(tokens, vec![HintToken::Word]);
    }

    #[test]
    fn test_single_side_centers_other_axis() {
        assert_eq!(
            Position::parse(Some("left")),
            Position::Token(Anchor::new(HAlign::Left, VAlign::Center))
        );
        assert_eq!(
            Position::parse(Some("south")),
            Position::Token(Anchor::new(HAlign::Center, VAlign::Bottom))
        );
    }

    #[test]
    fn test_middle_is_plot_center() {
        assert_eq!(
            Position::parse(Some("middle")),
            Position::Token(Anchor::new(HAlign::Center, VAlign::Center))
        );
    }

    #[test]
    fn test_compound_tokens() {
        assert_eq!(
            Position::parse(Some("south_center")),
            Position::Token(Anchor::new(HAlign::Center, VAlign::Bottom))
        );
        assert_eq!(
            Position::parse(Some("Top-Left")),
            Position::Token(Anchor::new(HAlign::Left, VAlign::Top))
        );
    }

    #[test]
    fn test_free_text_resolved_best_effort() {
        let pos = Position::parse(Some("on the left side of the plot"));
        assert!(!pos.is_recognized());
        assert_eq!(
            pos.anchor(),
            Some(Anchor::new(HAlign::Left, VAlign::Center))
        );
    }

    #[test]
    fn test_unrecognized_free_text_has_no_anchor() {
        let pos = Position::parse(Some("near the kitchen"));
        assert!(pos.is_specified());
        assert_eq!(pos.anchor(), None);
    }

    #[test]
    fn test_contradictory_hint_has_no_anchor() {
        let pos = Position::parse(Some("left right"));
        assert_eq!(pos.anchor(), None);
    }

    #[test]
    fn test_empty_hint_is_unspecified() {
        assert_eq!(Position::parse(Some("   ")), Position::Unspecified);
        assert_eq!(Position::parse(None), Position::Unspecified);
    }

    #[test]
    fn test_anchor_display() {
        assert_eq!(
            Anchor::new(HAlign::Left, VAlign::Top).to_string(),
            "top_left"
        );
        assert_eq!(
            Anchor::new(HAlign::Center, VAlign::Bottom).to_string(),
            "bottom"
        );
        assert_eq!(
            Anchor::new(HAlign::Center, VAlign::Center).to_string(),
            "center"
        );
    }
}
