//! True-side labels and the jury blinding bijection.

use serde::{Deserialize, Serialize};

/// One of the two debaters, identified by its true side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// The label used in judge prompts and verdicts ("Side A" / "Side B").
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "Side A",
            Self::B => "Side B",
        }
    }

    /// The other side.
    pub fn opponent(self) -> Side {
        match self {
            Self::A => Side::B,
            Self::B => Side::A,
        }
    }

    /// Parse a "Side A" / "Side B" label back into a side.
    pub fn from_label(label: &str) -> Option<Side> {
        match label {
            "Side A" => Some(Side::A),
            "Side B" => Some(Side::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Bijection from the label a judge saw to the true side behind it.
///
/// With blinding on, the text presented as "Side A" is really side B's
/// transcript and vice versa; the map records that swap so verdicts can be
/// translated back into true-side terms. Invariant: `{map(A), map(B)}`
/// always covers both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideMap {
    #[serde(rename = "A")]
    a: Side,
    #[serde(rename = "B")]
    b: Side,
}

impl SideMap {
    /// No blinding: presented labels are the true sides.
    pub fn identity() -> Self {
        Self {
            a: Side::A,
            b: Side::B,
        }
    }

    /// Blinded presentation: labels are swapped.
    pub fn swapped() -> Self {
        Self {
            a: Side::B,
            b: Side::A,
        }
    }

    /// The map matching a blind flag.
    pub fn for_blind(blind: bool) -> Self {
        if blind {
            Self::swapped()
        } else {
            Self::identity()
        }
    }

    /// Whether presented labels equal true sides.
    pub fn is_identity(self) -> bool {
        self.a == Side::A
    }

    /// The true side behind a presented label.
    pub fn true_side(self, presented: Side) -> Side {
        match presented {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    /// The inverse map (presented label for a true side).
    ///
    /// Both possible maps are their own inverse, but call sites that
    /// conceptually go true→presented should say so.
    pub fn invert(self) -> Self {
        match self.a {
            Side::A => Self::identity(),
            Side::B => Self::swapped(),
        }
    }
}

impl Default for SideMap {
    fn default() -> Self {
        Self::identity()
    }
}
