//! SVG transform attribute support.
//!
//! Transform strings such as `translate(10, 20) rotate(45)` are parsed into a
//! 2D affine matrix, decomposed into independent components and interpolated
//! component-wise. The result is rendered back as a normalized transform
//! string.
//!
//! ```
//! use segue_core::transform::interpolate_transform_svg;
//!
//! let i = interpolate_transform_svg("translate(0, 0)", "translate(100, 50)");
//! assert_eq!(i(0.5), "translate(50, 25)");
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::interpolate::Interpolate;

const DEGREES: f64 = 180.0 / PI;

/// A 2D affine transformation matrix.
///
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0  1  |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2D {
    /// Identity transform.
    pub fn identity() -> Self {
        Self::matrix(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Transform from raw SVG `matrix(a b c d e f)` components.
    pub fn matrix(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::matrix(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::matrix(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation from degrees.
    pub fn rotate_deg(angle_deg: f64) -> Self {
        let rad = angle_deg / DEGREES;
        let (sin, cos) = rad.sin_cos();
        Self::matrix(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Skew from degrees.
    pub fn skew_deg(skew_x_deg: f64, skew_y_deg: f64) -> Self {
        Self::matrix(
            1.0,
            (skew_y_deg / DEGREES).tan(),
            (skew_x_deg / DEGREES).tan(),
            1.0,
            0.0,
            0.0,
        )
    }

    /// Compose this transform with another (this * other).
    ///
    /// The resulting transform applies `other` first, then `self`.
    pub fn then(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            tx: self.a * other.tx + self.c * other.ty + self.tx,
            ty: self.b * other.tx + self.d * other.ty + self.ty,
        }
    }

    /// Apply this transform to a point.
    pub fn apply_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Decompose into translate, rotate, skewX and scale components.
    ///
    /// Angles come out in degrees; the matrix equals
    /// `translate * rotate * skewX * scale`.
    pub fn decompose(&self) -> DecomposedTransform {
        let (mut a, mut b, mut c, mut d) = (self.a, self.b, self.c, self.d);

        let mut scale_x = (a * a + b * b).sqrt();
        if scale_x != 0.0 {
            a /= scale_x;
            b /= scale_x;
        }

        let mut skew = a * c + b * d;
        if skew != 0.0 {
            c -= a * skew;
            d -= b * skew;
        }

        let scale_y = (c * c + d * d).sqrt();
        if scale_y != 0.0 {
            c /= scale_y;
            d /= scale_y;
            skew /= scale_y;
        }

        // Reflection: fold the sign into the x axis.
        if a * d < b * c {
            a = -a;
            b = -b;
            skew = -skew;
            scale_x = -scale_x;
        }

        DecomposedTransform {
            translate_x: self.tx,
            translate_y: self.ty,
            rotate: b.atan2(a) * DEGREES,
            skew_x: skew.atan() * DEGREES,
            scale_x,
            scale_y,
        }
    }

    /// Parse an SVG `transform` attribute.
    ///
    /// Unknown functions and malformed argument lists are skipped; an empty
    /// string is the identity.
    pub fn parse_svg(input: &str) -> Self {
        let mut result = Self::identity();
        let mut rest = input;

        while let Some(open) = rest.find('(') {
            let name = rest[..open]
                .trim_matches(|c: char| c.is_whitespace() || c == ',')
                .to_ascii_lowercase();
            let Some(close) = rest[open..].find(')') else {
                break;
            };
            let args: Vec<f64> = rest[open + 1..open + close]
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .filter_map(|s| s.parse().ok())
                .collect();
            rest = &rest[open + close + 1..];

            let step = match (name.as_str(), args.as_slice()) {
                ("matrix", [a, b, c, d, e, f]) => Self::matrix(*a, *b, *c, *d, *e, *f),
                ("translate", [x]) => Self::translate(*x, 0.0),
                ("translate", [x, y]) => Self::translate(*x, *y),
                ("scale", [s]) => Self::scale(*s, *s),
                ("scale", [sx, sy]) => Self::scale(*sx, *sy),
                ("rotate", [angle]) => Self::rotate_deg(*angle),
                ("rotate", [angle, cx, cy]) => Self::translate(*cx, *cy)
                    .then(&Self::rotate_deg(*angle))
                    .then(&Self::translate(-cx, -cy)),
                ("skewx", [angle]) => Self::skew_deg(*angle, 0.0),
                ("skewy", [angle]) => Self::skew_deg(0.0, *angle),
                _ => continue,
            };
            result = result.then(&step);
        }

        result
    }
}

/// Decomposed 2D transform components (angles in degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecomposedTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub rotate: f64,
    pub skew_x: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for DecomposedTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl DecomposedTransform {
    pub fn identity() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            rotate: 0.0,
            skew_x: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Render as an SVG transform string, omitting identity components.
    pub fn to_svg_string(&self) -> String {
        let (tx, ty) = (round6(self.translate_x), round6(self.translate_y));
        let (rotate, skew_x) = (round6(self.rotate), round6(self.skew_x));
        let (sx, sy) = (round6(self.scale_x), round6(self.scale_y));

        let mut parts = Vec::new();
        if tx != 0.0 || ty != 0.0 {
            parts.push(format!("translate({}, {})", fmt_num(tx), fmt_num(ty)));
        }
        if rotate != 0.0 {
            parts.push(format!("rotate({})", fmt_num(rotate)));
        }
        if skew_x != 0.0 {
            parts.push(format!("skewX({})", fmt_num(skew_x)));
        }
        if sx != 1.0 || sy != 1.0 {
            parts.push(format!("scale({}, {})", fmt_num(sx), fmt_num(sy)));
        }
        parts.join(" ")
    }
}

impl Interpolate for DecomposedTransform {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self {
            translate_x: self.translate_x.interpolate(&to.translate_x, t),
            translate_y: self.translate_y.interpolate(&to.translate_y, t),
            rotate: interpolate_angle(self.rotate, to.rotate, t),
            skew_x: self.skew_x.interpolate(&to.skew_x, t),
            scale_x: self.scale_x.interpolate(&to.scale_x, t),
            scale_y: self.scale_y.interpolate(&to.scale_y, t),
        }
    }
}

/// Interpolate between two angles in degrees, taking the shortest path.
fn interpolate_angle(from: f64, to: f64, t: f64) -> f64 {
    let mut diff = to - from;
    if diff > 180.0 {
        diff -= 360.0;
    } else if diff < -180.0 {
        diff += 360.0;
    }
    from + diff * t
}

/// Trim float noise so rendered strings stay stable.
fn round6(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}

fn fmt_num(v: f64) -> String {
    // Avoid rendering "-0".
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

/// Build an interpolator between two SVG transform strings.
pub fn interpolate_transform_svg(from: &str, to: &str) -> impl Fn(f64) -> String + 'static {
    let a = Transform2D::parse_svg(from).decompose();
    let b = Transform2D::parse_svg(to).decompose();
    move |t| a.interpolate(&b, t).to_svg_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_identity_parse() {
        assert_eq!(Transform2D::parse_svg(""), Transform2D::identity());
        assert_eq!(Transform2D::parse_svg("bogus"), Transform2D::identity());
    }

    #[test]
    fn test_parse_translate_scale() {
        let t = Transform2D::parse_svg("translate(10, 20) scale(2)");
        let (x, y) = t.apply_point(1.0, 1.0);
        assert!(approx_eq(x, 12.0));
        assert!(approx_eq(y, 22.0));
    }

    #[test]
    fn test_parse_rotate_about_center() {
        let t = Transform2D::parse_svg("rotate(90 10 10)");
        let (x, y) = t.apply_point(20.0, 10.0);
        assert!((x - 10.0).abs() < 1e-6);
        assert!((y - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_decompose_round_trip_components() {
        let t = Transform2D::parse_svg("translate(5,6) rotate(30) skewX(10) scale(2,3)");
        let d = t.decompose();
        assert!((d.translate_x - 5.0).abs() < 1e-6);
        assert!((d.translate_y - 6.0).abs() < 1e-6);
        assert!((d.rotate - 30.0).abs() < 1e-6);
        assert!((d.skew_x - 10.0).abs() < 1e-6);
        assert!((d.scale_x - 2.0).abs() < 1e-6);
        assert!((d.scale_y - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_interpolate_translate() {
        let i = interpolate_transform_svg("translate(0, 0)", "translate(100, 50)");
        assert_eq!(i(0.0), "");
        assert_eq!(i(0.5), "translate(50, 25)");
        assert_eq!(i(1.0), "translate(100, 50)");
    }

    #[test]
    fn test_rotation_takes_short_path() {
        let i = interpolate_transform_svg("rotate(170)", "rotate(-170)");
        assert_eq!(i(0.5), "rotate(180)");
    }

    #[test]
    fn test_scale_rendered() {
        let i = interpolate_transform_svg("scale(1)", "scale(3, 2)");
        assert_eq!(i(0.5), "scale(2, 1.5)");
    }
}
