//! Path geometry for flow animations.
//!
//! Arrow markers need two things from a path: its length, and the point and
//! tangent at a distance along it. [`PathGeometry`] is that contract.
//! [`Polyline`] implements it by parsing SVG path data and flattening curves
//! into straight segments.
//!
//! # Supported Path Data
//!
//! | Command | Meaning |
//! |---------|---------|
//! | `M` / `m` | move to (extra pairs are line-to) |
//! | `L` / `l` | line to |
//! | `H` / `h`, `V` / `v` | horizontal / vertical line |
//! | `C` / `c` | cubic Bézier |
//! | `Q` / `q` | quadratic Bézier |
//! | `Z` / `z` | close path |
//!
//! Lowercase commands are relative to the current point. Arcs and smooth
//! curve shorthands are rejected with [`GeometryError::UnsupportedCommand`].

use crate::error::GeometryError;

/// Straight segments per flattened curve.
pub const CURVE_SEGMENTS: usize = 16;

/// Sampled position on a path, with the tangent angle in degrees
/// (0° points along +X, 90° along +Y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
    pub angle_degrees: f32,
}

/// Length and sampling queries on a path.
pub trait PathGeometry {
    /// Total length. `None` when the path has no measurable length.
    fn total_length(&self) -> Option<f32>;

    /// Point at `distance` from the start, clamped to the path.
    fn point_at_length(
        &self,
        distance: f32,
    ) -> Option<PathPoint>;
}

// =============================================================================
// Polyline
// =============================================================================

/// Flattened path: points plus cumulative length at each point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polyline {
    points: Vec<(f32, f32)>,
    cumulative: Vec<f32>,
}

impl Polyline {
    /// Parse SVG path data.
    pub fn parse(data: &str) -> Result<Self, GeometryError> {
        let mut cursor = Cursor::new(data);
        let Some((first, _)) = cursor.command()? else {
            return Err(GeometryError::Empty);
        };
        if !matches!(first, 'M' | 'm') {
            return Err(GeometryError::MissingMoveTo { found: first });
        }

        let mut line = Self::default();
        let mut current = (0.0_f32, 0.0_f32);
        let mut subpath_start = current;
        let mut command = first;

        loop {
            let relative = command.is_ascii_lowercase();
            let origin = if relative { current } else { (0.0, 0.0) };

            match command.to_ascii_uppercase() {
                'M' => {
                    current = cursor.pair(command, origin)?;
                    subpath_start = current;
                    line.push(current);
                    // Extra coordinate pairs after a move are line-to.
                    command = if relative { 'l' } else { 'L' };
                }
                'L' => {
                    current = cursor.pair(command, origin)?;
                    line.push(current);
                }
                'H' => {
                    current.0 = origin.0 + cursor.number(command)?;
                    line.push(current);
                }
                'V' => {
                    current.1 = origin.1 + cursor.number(command)?;
                    line.push(current);
                }
                'C' => {
                    let c1 = cursor.pair(command, origin)?;
                    let c2 = cursor.pair(command, origin)?;
                    let end = cursor.pair(command, origin)?;
                    let start = current;
                    for i in 1..=CURVE_SEGMENTS {
                        let t = i as f32 / CURVE_SEGMENTS as f32;
                        line.push(cubic(start, c1, c2, end, t));
                    }
                    current = end;
                }
                'Q' => {
                    let control = cursor.pair(command, origin)?;
                    let end = cursor.pair(command, origin)?;
                    let start = current;
                    for i in 1..=CURVE_SEGMENTS {
                        let t = i as f32 / CURVE_SEGMENTS as f32;
                        line.push(quadratic(start, control, end, t));
                    }
                    current = end;
                }
                'Z' => {
                    current = subpath_start;
                    line.push(current);
                }
                _ => {
                    return Err(GeometryError::UnsupportedCommand { command, offset: cursor.last_command_offset });
                }
            }

            if !matches!(command, 'Z' | 'z') && cursor.at_number() {
                continue;
            }
            match cursor.command()? {
                Some((next, _)) => command = next,
                None => break,
            }
        }

        Ok(line)
    }

    pub fn points(&self) -> &[(f32, f32)] { &self.points }

    fn push(
        &mut self,
        point: (f32, f32),
    ) {
        match self.points.last() {
            None => self.cumulative.push(0.0),
            Some(&last) if last == point => return,
            Some(&(lx, ly)) => {
                let total = self.cumulative.last().copied().unwrap_or(0.0);
                self.cumulative.push(total + (point.0 - lx).hypot(point.1 - ly));
            }
        }
        self.points.push(point);
    }
}

impl PathGeometry for Polyline {
    fn total_length(&self) -> Option<f32> {
        let total = *self.cumulative.last()?;
        (total.is_finite() && total > 0.0).then_some(total)
    }

    fn point_at_length(
        &self,
        distance: f32,
    ) -> Option<PathPoint> {
        let total = self.total_length()?;
        let distance = if distance.is_finite() { distance.clamp(0.0, total) } else { 0.0 };

        // First point at or beyond `distance`; the segment ends there.
        let end = self.cumulative.partition_point(|&c| c < distance).clamp(1, self.points.len() - 1);
        let (x0, y0) = self.points[end - 1];
        let (x1, y1) = self.points[end];
        let segment = self.cumulative[end] - self.cumulative[end - 1];
        let t = if segment > 0.0 { (distance - self.cumulative[end - 1]) / segment } else { 0.0 };

        Some(PathPoint {
            x: x0 + (x1 - x0) * t,
            y: y0 + (y1 - y0) * t,
            angle_degrees: (y1 - y0).atan2(x1 - x0).to_degrees(),
        })
    }
}

fn cubic(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
    t: f32,
) -> (f32, f32) {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    (a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0, a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1)
}

fn quadratic(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    t: f32,
) -> (f32, f32) {
    let u = 1.0 - t;
    let (a, b, c) = (u * u, 2.0 * u * t, t * t);
    (a * p0.0 + b * p1.0 + c * p2.0, a * p0.1 + b * p1.1 + c * p2.1)
}

// =============================================================================
// Tokenizer
// =============================================================================

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    last_command_offset: usize,
}

impl<'a> Cursor<'a> {
    const fn new(src: &'a str) -> Self { Self { src, pos: 0, last_command_offset: 0 } }

    fn peek(&self) -> Option<u8> { self.src.as_bytes().get(self.pos).copied() }

    fn skip_separators(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace() || b == b',') {
            self.pos += 1;
        }
    }

    /// Next command letter, or `None` at the end of input.
    fn command(&mut self) -> Result<Option<(char, usize)>, GeometryError> {
        self.skip_separators();
        let Some(byte) = self.peek() else {
            return Ok(None);
        };
        let offset = self.pos;
        let command = char::from(byte);
        if !byte.is_ascii_alphabetic() {
            return Err(GeometryError::UnsupportedCommand { command, offset });
        }
        self.pos += 1;
        self.last_command_offset = offset;
        Ok(Some((command, offset)))
    }

    fn at_number(&mut self) -> bool {
        self.skip_separators();
        self.peek().is_some_and(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'))
    }

    fn number(
        &mut self,
        command: char,
    ) -> Result<f32, GeometryError> {
        self.skip_separators();
        let start = self.pos;
        let bytes = self.src.as_bytes();
        let digits = |pos: &mut usize| {
            while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
                *pos += 1;
            }
        };

        let mut pos = start;
        if matches!(bytes.get(pos), Some(b'-' | b'+')) {
            pos += 1;
        }
        digits(&mut pos);
        if bytes.get(pos) == Some(&b'.') {
            pos += 1;
            digits(&mut pos);
        }
        if matches!(bytes.get(pos), Some(b'e' | b'E')) {
            let mut exponent = pos + 1;
            if matches!(bytes.get(exponent), Some(b'-' | b'+')) {
                exponent += 1;
            }
            if bytes.get(exponent).is_some_and(u8::is_ascii_digit) {
                digits(&mut exponent);
                pos = exponent;
            }
        }

        let value = self.src[start..pos]
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or(GeometryError::ExpectedNumber { command, offset: start })?;
        self.pos = pos;
        Ok(value)
    }

    fn pair(
        &mut self,
        command: char,
        origin: (f32, f32),
    ) -> Result<(f32, f32), GeometryError> {
        let x = self.number(command)?;
        let y = self.number(command)?;
        Ok((origin.0 + x, origin.1 + y))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::FlowKey;

    fn approx(
        a: f32,
        b: f32,
    ) -> bool {
        (a - b).abs() < 0.01
    }

    // =========================================================================
    // Parser Tests
    // =========================================================================

    #[test]
    fn test_parse_straight_lines() {
        let line = Polyline::parse("M 0 0 L 30 0 L 30 40").unwrap();
        assert_eq!(line.points(), &[(0.0, 0.0), (30.0, 0.0), (30.0, 40.0)]);
        assert_eq!(line.total_length(), Some(70.0));
    }

    #[test]
    fn test_parse_relative_and_shorthand() {
        let line = Polyline::parse("m10,10 h20 v-5 l-20,0 z").unwrap();
        assert_eq!(line.points(), &[(10.0, 10.0), (30.0, 10.0), (30.0, 5.0), (10.0, 5.0), (10.0, 10.0)]);
    }

    #[test]
    fn test_implicit_line_after_move() {
        let line = Polyline::parse("M 0 0 10 0 10 10").unwrap();
        assert_eq!(line.points().len(), 3);
        assert_eq!(line.total_length(), Some(20.0));
    }

    #[test]
    fn test_compact_numbers() {
        let line = Polyline::parse("M0-5L1e1-5").unwrap();
        assert_eq!(line.points(), &[(0.0, -5.0), (10.0, -5.0)]);
    }

    #[test]
    fn test_curves_are_flattened() {
        let quad = Polyline::parse("M 0 0 Q 50 100 100 0").unwrap();
        assert_eq!(quad.points().len(), CURVE_SEGMENTS + 1);
        let length = quad.total_length().unwrap();
        assert!(length > 100.0 && length < 200.0, "curve longer than its chord: {length}");
        assert_eq!(quad.points().last(), Some(&(100.0, 0.0)));

        let cubic = Polyline::parse("M 0 0 C 0 50 100 50 100 0").unwrap();
        assert_eq!(cubic.points().last(), Some(&(100.0, 0.0)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Polyline::parse("   "), Err(GeometryError::Empty));
        assert_eq!(Polyline::parse("L 1 1"), Err(GeometryError::MissingMoveTo { found: 'L' }));
        assert_eq!(
            Polyline::parse("M 0 0 A 1 1 0 0 1 5 5"),
            Err(GeometryError::UnsupportedCommand { command: 'A', offset: 6 })
        );
        assert_eq!(Polyline::parse("M 0"), Err(GeometryError::ExpectedNumber { command: 'M', offset: 3 }));
    }

    #[test]
    fn test_all_flow_paths_parse() {
        for key in FlowKey::ALL {
            let line = Polyline::parse(key.path()).unwrap_or_else(|e| panic!("{key}: {e}"));
            assert!(line.total_length().is_some(), "{key} must have a measurable length");
        }
    }

    // =========================================================================
    // Sampling Tests
    // =========================================================================

    #[test]
    fn test_point_at_length() {
        let line = Polyline::parse("M 0 0 L 30 0 L 30 40").unwrap();

        let start = line.point_at_length(0.0).unwrap();
        assert!(approx(start.x, 0.0) && approx(start.y, 0.0));
        assert!(approx(start.angle_degrees, 0.0));

        let corner = line.point_at_length(45.0).unwrap();
        assert!(approx(corner.x, 30.0) && approx(corner.y, 15.0));
        assert!(approx(corner.angle_degrees, 90.0), "second leg points down");
    }

    #[test]
    fn test_point_at_length_clamps() {
        let line = Polyline::parse("M 0 0 L 10 0").unwrap();
        let past_end = line.point_at_length(50.0).unwrap();
        assert!(approx(past_end.x, 10.0));
        let before_start = line.point_at_length(-5.0).unwrap();
        assert!(approx(before_start.x, 0.0));
        let nan = line.point_at_length(f32::NAN).unwrap();
        assert!(approx(nan.x, 0.0));
    }

    #[test]
    fn test_degenerate_path_has_no_length() {
        let line = Polyline::parse("M 5 5 L 5 5").unwrap();
        assert_eq!(line.total_length(), None);
        assert_eq!(line.point_at_length(0.0), None);
    }
}
