//! Output channels that an animated scalar can be bound to.

use enum_map::Enum;
use serde::{Deserialize, Serialize};

/// A visual property driven by a single spring value.
///
/// Channels only describe how a value is presented; the spring itself is unit-less. Use
/// [`css`](Self::css) to render a value in the form a style sheet expects.
#[derive(Clone, Copy, Debug, Enum, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    /// Opacity, from `0.0` (transparent) to `1.0` (opaque).
    Opacity,
    /// Uniform scale factor.
    Scale,
    /// Rotation in degrees.
    Rotate,
    /// Horizontal offset in pixels.
    TranslateX,
    /// Vertical offset in pixels.
    TranslateY,
}

impl Channel {
    /// Unit suffix of the channel's values, or an empty string if unit-less.
    pub fn unit(self) -> &'static str {
        match self {
            Channel::Opacity | Channel::Scale => "",
            Channel::Rotate => "deg",
            Channel::TranslateX | Channel::TranslateY => "px",
        }
    }

    /// Value at which the channel has no visible effect on its element.
    pub fn identity(self) -> f64 {
        match self {
            Channel::Opacity | Channel::Scale => 1.0,
            Channel::Rotate | Channel::TranslateX | Channel::TranslateY => 0.0,
        }
    }

    /// Formats `value` as a CSS property value: a plain number for opacity, a transform function
    /// for everything else.
    ///
    /// ```
    /// use tensile_core::channel::Channel;
    ///
    /// assert_eq!(Channel::Opacity.css(0.5), "0.5");
    /// assert_eq!(Channel::Rotate.css(45.0), "rotate(45deg)");
    /// assert_eq!(Channel::TranslateY.css(-12.5), "translateY(-12.5px)");
    /// ```
    pub fn css(self, value: f64) -> String {
        let unit = self.unit();
        match self {
            Channel::Opacity => format!("{value}"),
            Channel::Scale => format!("scale({value})"),
            Channel::Rotate => format!("rotate({value}{unit})"),
            Channel::TranslateX => format!("translateX({value}{unit})"),
            Channel::TranslateY => format!("translateY({value}{unit})"),
        }
    }
}

/// Direction an element travels while sliding into place.
///
/// A slide animates a distance down to zero (see
/// [`SpringOptions::slide_in`](crate::controller::SpringOptions::slide_in)); the direction decides
/// which translation channel receives that distance and with which sign.
#[derive(Clone, Copy, Debug, Default, Enum, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideDirection {
    /// Enters from below, moving up.
    #[default]
    Up,
    /// Enters from above, moving down.
    Down,
    /// Enters from the right, moving left.
    Left,
    /// Enters from the left, moving right.
    Right,
}

impl SlideDirection {
    /// Translation channel that the slide distance is applied to.
    pub fn channel(self) -> Channel {
        match self {
            SlideDirection::Up | SlideDirection::Down => Channel::TranslateY,
            SlideDirection::Left | SlideDirection::Right => Channel::TranslateX,
        }
    }

    /// Converts a remaining slide distance into an offset on [`channel`](Self::channel).
    pub fn offset(self, distance: f64) -> f64 {
        match self {
            SlideDirection::Up | SlideDirection::Left => distance,
            // Subtracting from zero keeps a finished slide at `0` rather than `-0`.
            SlideDirection::Down | SlideDirection::Right => 0.0 - distance,
        }
    }

    /// Formats the remaining slide distance as a CSS transform.
    pub fn css(self, distance: f64) -> String {
        self.channel().css(self.offset(distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_match_channel_kind() {
        assert_eq!(Channel::Opacity.unit(), "");
        assert_eq!(Channel::Scale.unit(), "");
        assert_eq!(Channel::Rotate.unit(), "deg");
        assert_eq!(Channel::TranslateX.unit(), "px");
    }

    #[test]
    fn css_formats_transform_functions() {
        assert_eq!(Channel::Scale.css(1.25), "scale(1.25)");
        assert_eq!(Channel::TranslateX.css(10.0), "translateX(10px)");
    }

    #[test]
    fn identity_leaves_element_unchanged() {
        assert_eq!(Channel::Opacity.identity(), 1.0);
        assert_eq!(Channel::Scale.identity(), 1.0);
        assert_eq!(Channel::TranslateY.identity(), 0.0);
    }

    #[test]
    fn when_sliding_down_or_right_then_offset_is_negated() {
        assert_eq!(SlideDirection::Up.offset(50.0), 50.0);
        assert_eq!(SlideDirection::Down.offset(50.0), -50.0);
        assert_eq!(SlideDirection::Left.offset(50.0), 50.0);
        assert_eq!(SlideDirection::Right.offset(50.0), -50.0);
    }

    #[test]
    fn slide_direction_picks_translation_axis() {
        assert_eq!(SlideDirection::Down.css(20.0), "translateY(-20px)");
        assert_eq!(SlideDirection::Left.css(20.0), "translateX(20px)");
        assert_eq!(SlideDirection::Right.css(0.0), "translateX(0px)");
    }

    #[test]
    fn deserializes_from_names() {
        let channel: Channel = serde_json::from_str(r#""translateX""#).unwrap();
        let direction: SlideDirection = serde_json::from_str(r#""right""#).unwrap();

        assert_eq!(channel, Channel::TranslateX);
        assert_eq!(direction, SlideDirection::Right);
    }
}
