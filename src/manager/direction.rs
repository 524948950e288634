/// Average compass bearings (degrees) by summing unit vectors.
///
/// Returns `None` when there are no samples or when the mean cosine is exactly
/// zero (for example two opposite bearings), where the bearing is undefined.
pub fn circular_mean(angles: &[f64]) -> Option<f64> {
    if angles.is_empty() {
        return None;
    }

    let (sin_sum, cos_sum) = angles.iter().fold((0.0_f64, 0.0_f64), |(s, c), angle| {
        let r = angle.to_radians();
        (s + r.sin(), c + r.cos())
    });

    let n = angles.len() as f64;
    let s = sin_sum / n;
    let c = cos_sum / n;
    if c == 0.0 {
        return None;
    }

    let arc = (s / c).atan().to_degrees();
    let average = if s > 0.0 && c > 0.0 {
        arc
    } else if c < 0.0 {
        //quadrants II and III
        arc + 180.0
    } else if s < 0.0 && c > 0.0 {
        arc + 360.0
    } else {
        0.0
    };

    if average == 360.0 {
        Some(0.0)
    } else {
        Some(average)
    }
}

/// Eight-point compass rose, used to print a bearing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WindDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl WindDirection {
    pub fn from_degrees(degrees: f64) -> WindDirection {
        let sector = ((degrees.rem_euclid(360.0) + 22.5) / 45.0).floor() as u32 % 8;
        match sector {
            0 => WindDirection::North,
            1 => WindDirection::NorthEast,
            2 => WindDirection::East,
            3 => WindDirection::SouthEast,
            4 => WindDirection::South,
            5 => WindDirection::SouthWest,
            6 => WindDirection::West,
            _ => WindDirection::NorthWest,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            WindDirection::North => "N",
            WindDirection::NorthEast => "NE",
            WindDirection::East => "E",
            WindDirection::SouthEast => "SE",
            WindDirection::South => "S",
            WindDirection::SouthWest => "SW",
            WindDirection::West => "W",
            WindDirection::NorthWest => "NW",
        }
    }
}
