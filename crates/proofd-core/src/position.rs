use serde::{Deserialize, Serialize};

/// Horizontal slide distance for entrance and exit animations, in pixels.
pub const SLIDE_DISTANCE_PX: i32 = 20;
/// Gap between the popup and the viewport edges, in pixels.
pub const EDGE_MARGIN_PX: u32 = 20;

/// Screen corner a popup is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopRight,
    #[default]
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Right,
}

impl Vertical {
    pub fn css_property(self) -> &'static str {
        match self {
            Vertical::Top => "top",
            Vertical::Bottom => "bottom",
        }
    }
}

impl Horizontal {
    pub fn css_property(self) -> &'static str {
        match self {
            Horizontal::Left => "left",
            Horizontal::Right => "right",
        }
    }
}

/// Horizontal translation applied while the popup is off its resting place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideVector {
    pub dx: i32,
}

impl SlideVector {
    /// Offset at `progress` of an entrance (1.0 = fully in place).
    pub fn entering_offset(self, progress: f64) -> f64 {
        f64::from(self.dx) * (1.0 - progress.clamp(0.0, 1.0))
    }

    /// Offset at `progress` of an exit (1.0 = fully out).
    pub fn exiting_offset(self, progress: f64) -> f64 {
        f64::from(self.dx) * progress.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub vertical: Vertical,
    pub horizontal: Horizontal,
    pub margin_px: u32,
    pub slide_in: SlideVector,
    pub slide_out: SlideVector,
}

impl Position {
    pub fn anchor(self) -> (Vertical, Horizontal) {
        match self {
            Position::TopLeft => (Vertical::Top, Horizontal::Left),
            Position::TopRight => (Vertical::Top, Horizontal::Right),
            Position::BottomLeft => (Vertical::Bottom, Horizontal::Left),
            Position::BottomRight => (Vertical::Bottom, Horizontal::Right),
        }
    }

    /// Resolve where the popup sits and which way it slides. The slide always
    /// points off the anchored edge; entrance and exit share one vector.
    pub fn placement(self) -> Placement {
        let (vertical, horizontal) = self.anchor();
        let dx = match horizontal {
            Horizontal::Left => -SLIDE_DISTANCE_PX,
            Horizontal::Right => SLIDE_DISTANCE_PX,
        };
        let slide = SlideVector { dx };
        Placement {
            vertical,
            horizontal,
            margin_px: EDGE_MARGIN_PX,
            slide_in: slide,
            slide_out: slide,
        }
    }

    pub const ALL: [Position; 4] = [
        Position::TopLeft,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomRight,
    ];
}
