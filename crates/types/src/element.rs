//! The box / glue / penalty element model.
use crate::dimension::Dimension;
use crate::ids::ProducerId;
use serde::{Deserialize, Serialize};

/// Penalty cost at or beyond which a break is forbidden (positive) or forced (negative).
pub const INFINITE: i32 = 1000;

/// Stretch given to the glue that fills the last line of a paragraph or the last page.
pub const FILL_STRETCH: i32 = 1_000_000_000;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Element {
    /// Unbreakable content of fixed width.
    Box {
        width: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        producer: Option<ProducerId>,
    },
    /// Breakable, adjustable whitespace.
    Glue {
        width: Dimension,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        producer: Option<ProducerId>,
    },
    /// An explicit candidate break point.
    Penalty {
        #[serde(default)]
        width: i32,
        cost: i32,
        #[serde(default)]
        flagged: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        producer: Option<ProducerId>,
    },
}

impl Element {
    pub fn boxed(width: i32) -> Self {
        Element::Box { width, producer: None }
    }

    pub fn glue(natural: i32, stretch: i32, shrink: i32) -> Self {
        Element::Glue {
            width: Dimension::flexible(natural, stretch, shrink),
            producer: None,
        }
    }

    pub fn penalty(width: i32, cost: i32, flagged: bool) -> Self {
        Element::Penalty {
            width,
            cost: cost.clamp(-INFINITE, INFINITE),
            flagged,
            producer: None,
        }
    }

    pub fn forced_break() -> Self {
        Self::penalty(0, -INFINITE, false)
    }

    pub fn forbidden_break() -> Self {
        Self::penalty(0, INFINITE, false)
    }

    /// Glue with unbounded stretch, used to fill the end of a paragraph or flow.
    pub fn fill() -> Self {
        Element::Glue {
            width: Dimension::new(0, 0, FILL_STRETCH),
            producer: None,
        }
    }

    pub fn with_producer(self, id: ProducerId) -> Self {
        match self {
            Element::Box { width, .. } => Element::Box { width, producer: Some(id) },
            Element::Glue { width, .. } => Element::Glue { width, producer: Some(id) },
            Element::Penalty { width, cost, flagged, .. } => Element::Penalty {
                width,
                cost,
                flagged,
                producer: Some(id),
            },
        }
    }

    pub fn producer(&self) -> Option<ProducerId> {
        match self {
            Element::Box { producer, .. }
            | Element::Glue { producer, .. }
            | Element::Penalty { producer, .. } => *producer,
        }
    }

    pub fn is_box(&self) -> bool {
        matches!(self, Element::Box { .. })
    }

    pub fn is_glue(&self) -> bool {
        matches!(self, Element::Glue { .. })
    }

    pub fn is_penalty(&self) -> bool {
        matches!(self, Element::Penalty { .. })
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, Element::Penalty { flagged: true, .. })
    }

    pub fn is_forced_break(&self) -> bool {
        matches!(self, Element::Penalty { cost, .. } if *cost <= -INFINITE)
    }

    pub fn is_forbidden_break(&self) -> bool {
        matches!(self, Element::Penalty { cost, .. } if *cost >= INFINITE)
    }

    /// Penalty cost, or zero for boxes and glue.
    pub fn cost(&self) -> i32 {
        match self {
            Element::Penalty { cost, .. } => *cost,
            _ => 0,
        }
    }

    /// The extent this element contributes to a line or page when it does not end it.
    ///
    /// Penalties contribute nothing unless chosen as the break, in which case
    /// their width is accounted for separately.
    pub fn extent(&self) -> Dimension {
        match self {
            Element::Box { width, .. } => Dimension::fixed(*width),
            Element::Glue { width, .. } => *width,
            Element::Penalty { .. } => Dimension::ZERO,
        }
    }

    /// Width added to a line that ends at this element.
    pub fn break_width(&self) -> i32 {
        match self {
            Element::Penalty { width, .. } => *width,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialized_glue_has_ordered_width() {
        let glue: Element =
            serde_json::from_str(r#"{"type": "glue", "width": {"min": 10, "opt": 0, "max": -5}}"#)
                .unwrap();
        assert!(glue.is_glue());
        assert_eq!(glue.extent(), Dimension::ZERO);

        let stretchy: Element =
            serde_json::from_str(r#"{"type": "glue", "width": {"min": 7, "opt": 10, "max": 15}}"#)
                .unwrap();
        assert_eq!(stretchy, Element::glue(10, 5, 3));
    }
}
