use crate::error::WmError;
use serde_derive::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Where the watermark sits on the canvas.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Position {
    Centered,
    TopLeft,
    TopCenter,
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Position {
    pub const ALL: [Position; 7] = [
        Position::Centered,
        Position::TopLeft,
        Position::TopCenter,
        Position::TopRight,
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        use Position::*;
        match self {
            Centered => "centered",
            TopLeft => "top-left",
            TopCenter => "top-center",
            TopRight => "top-right",
            BottomLeft => "bottom-left",
            BottomCenter => "bottom-center",
            BottomRight => "bottom-right",
        }
    }

    /// Top-left corner of a `size` watermark on a `canvas`, kept `border`
    /// pixels away from the edges it is anchored to.
    ///
    /// Offsets are signed: an oversized watermark or border pushes the corner
    /// off the canvas, and the paste clips whatever falls outside.
    pub fn offset(self, canvas: (u32, u32), size: (u32, u32), border: u32) -> (i64, i64) {
        use Position::*;
        let (width, height) = (i64::from(canvas.0), i64::from(canvas.1));
        let (wm_width, wm_height) = (i64::from(size.0), i64::from(size.1));
        let border = i64::from(border);

        let center_x = (width - wm_width).div_euclid(2);
        let center_y = (height - wm_height).div_euclid(2);
        let right = width - wm_width - border;
        let bottom = height - wm_height - border;

        match self {
            Centered => (center_x, center_y),
            TopLeft => (border, border),
            TopCenter => (center_x, border),
            TopRight => (right, border),
            BottomLeft => (border, bottom),
            BottomCenter => (center_x, bottom),
            BottomRight => (right, bottom),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = WmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Position::*;
        match s.trim().to_lowercase().as_ref() {
            "centered" => Ok(Centered),
            "top-left" => Ok(TopLeft),
            "top-center" => Ok(TopCenter),
            "top-right" => Ok(TopRight),
            "bottom-left" => Ok(BottomLeft),
            "bottom-center" => Ok(BottomCenter),
            "bottom-right" => Ok(BottomRight),
            _ => Err(WmError::InvalidPosition(s.to_string())),
        }
    }
}

impl TryFrom<String> for Position {
    type Error = WmError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_position_name() {
        for position in Position::ALL {
            assert_eq!(position.as_str().parse::<Position>().unwrap(), position);
            assert_eq!(position.to_string(), position.as_str());
        }
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(" Top-Left\n".parse::<Position>().unwrap(), Position::TopLeft);
        assert_eq!("BOTTOM-CENTER".parse::<Position>().unwrap(), Position::BottomCenter);
    }

    #[test]
    fn unknown_position_is_rejected() {
        match "middle".parse::<Position>() {
            Err(WmError::InvalidPosition(s)) => assert_eq!(s, "middle"),
            other => panic!("expected InvalidPosition, got {:?}", other),
        }
        assert!("top left".parse::<Position>().is_err());
        assert!("".parse::<Position>().is_err());
    }

    #[test]
    fn offsets_follow_the_anchor() {
        let canvas = (1000, 800);
        let size = (80, 40);
        let border = 16;
        assert_eq!(Position::Centered.offset(canvas, size, border), (460, 380));
        assert_eq!(Position::TopLeft.offset(canvas, size, border), (16, 16));
        assert_eq!(Position::TopCenter.offset(canvas, size, border), (460, 16));
        assert_eq!(Position::TopRight.offset(canvas, size, border), (904, 16));
        assert_eq!(Position::BottomLeft.offset(canvas, size, border), (16, 744));
        assert_eq!(Position::BottomCenter.offset(canvas, size, border), (460, 744));
        assert_eq!(Position::BottomRight.offset(canvas, size, border), (904, 744));
    }

    #[test]
    fn centering_floors_towards_negative_infinity() {
        assert_eq!(Position::Centered.offset((11, 11), (4, 4), 0), (3, 3));
        assert_eq!(Position::Centered.offset((10, 10), (15, 15), 0), (-3, -3));
    }

    #[test]
    fn oversized_border_goes_off_canvas() {
        assert_eq!(Position::BottomRight.offset((100, 100), (50, 50), 80), (-30, -30));
    }
}
