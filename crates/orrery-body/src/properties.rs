//! Per-body properties settable from operator input
//!
//! Collision behaviors, the named color palette, and the lenient parsers
//! shared by the mod surface, the CSV loader, and the CLI. Operator input is
//! ad-hoc, so every parser here defaults rather than fails.

use serde::{Deserialize, Serialize};

/// What happens when a body makes contact with another body
///
/// # Examples
///
/// ```
/// use orrery_body::CollisionBehavior;
///
/// assert_eq!(CollisionBehavior::parse("SUBSUME"), CollisionBehavior::Subsume);
/// // Unrecognized input falls back to the elastic default
/// assert_eq!(CollisionBehavior::parse("bounce"), CollisionBehavior::Elastic);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionBehavior {
    /// Contact is ignored; the body only exerts and feels gravity
    None,
    /// The larger body absorbs the smaller body's mass
    Subsume,
    /// Mass-aware elastic bounce
    Elastic,
    /// Elastic bounce, but the body shatters above its velocity-change threshold
    Fragment,
}

impl CollisionBehavior {
    /// Parses a behavior name case-insensitively, defaulting to `Elastic`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => CollisionBehavior::None,
            "subsume" => CollisionBehavior::Subsume,
            "elastic" => CollisionBehavior::Elastic,
            "fragment" => CollisionBehavior::Fragment,
            _ => CollisionBehavior::Elastic,
        }
    }
}

impl std::fmt::Display for CollisionBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CollisionBehavior::None => "none",
            CollisionBehavior::Subsume => "subsume",
            CollisionBehavior::Elastic => "elastic",
            CollisionBehavior::Fragment => "fragment",
        };
        f.write_str(s)
    }
}

/// Named color tag carried through to the renderer
///
/// `Random` is a real value: the renderer (or a scenario generator) resolves
/// it to a concrete color when the body is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyColor {
    Random,
    Black,
    White,
    Darkgray,
    Gray,
    Lightgray,
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
    Orange,
    Brown,
    Pink,
}

const COLOR_NAMES: [(&str, BodyColor); 15] = [
    ("random", BodyColor::Random),
    ("black", BodyColor::Black),
    ("white", BodyColor::White),
    ("darkgray", BodyColor::Darkgray),
    ("gray", BodyColor::Gray),
    ("lightgray", BodyColor::Lightgray),
    ("red", BodyColor::Red),
    ("green", BodyColor::Green),
    ("blue", BodyColor::Blue),
    ("yellow", BodyColor::Yellow),
    ("magenta", BodyColor::Magenta),
    ("cyan", BodyColor::Cyan),
    ("orange", BodyColor::Orange),
    ("brown", BodyColor::Brown),
    ("pink", BodyColor::Pink),
];

impl BodyColor {
    /// Parses a color name case-insensitively, defaulting to `Random`
    ///
    /// # Examples
    ///
    /// ```
    /// use orrery_body::BodyColor;
    ///
    /// assert_eq!(BodyColor::parse("Blue"), BodyColor::Blue);
    /// assert_eq!(BodyColor::parse("chartreuse"), BodyColor::Random);
    /// ```
    pub fn parse(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();
        COLOR_NAMES
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, c)| *c)
            .unwrap_or(BodyColor::Random)
    }
}

impl std::fmt::Display for BodyColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = COLOR_NAMES
            .iter()
            .find(|(_, c)| c == self)
            .map(|(name, _)| *name)
            .unwrap_or("random");
        f.write_str(name)
    }
}

/// Parses a float, keeping `current` on failure
///
/// The mod surface applies `key=value` assignments from remote operators;
/// a bad value leaves the property untouched.
pub fn parse_f64_or(s: &str, current: f64) -> f64 {
    s.trim().parse().unwrap_or(current)
}

/// Parses a boolean the way operators type them: t/true/1/y/yes (any case)
///
/// Anything else is `false`.
pub fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "t" | "true" | "1" | "y" | "yes"
    )
}
