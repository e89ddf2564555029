//! Interpolation between state values.
//!
//! Two layers live here:
//! - `Interpolate`: plain value-to-value blending for numeric building blocks
//! - `InterpolatorFactory`: the capability an entity supplies so the
//!   scheduler can ask for an `Interpolator` per `(begin, end, attribute,
//!   namespace)` tuple
//!
//! `StandardInterpolator` is the general-purpose factory: numbers, CSS
//! colors, SVG transforms and strings with embedded numbers.

use super::error::{Result, TransitionError};
use super::transform::interpolate_transform_svg;
use super::types::Value;

/// Per-frame interpolation function: normalized time to value.
pub type Interpolator = Box<dyn Fn(f64) -> Value>;

/// Trait for types that can be blended between two values.
pub trait Interpolate: Sized {
    /// Interpolate between self (t = 0) and `to` (t = 1).
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(*self, *to, t)
    }
}

impl Interpolate for [f64; 4] {
    /// Per-component RGBA blend.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        [
            lerp(self[0], to[0], t),
            lerp(self[1], to[1], t),
            lerp(self[2], to[2], t),
            lerp(self[3], to[3], t),
        ]
    }
}

/// Capability that turns a begin/end pair into an interpolator.
///
/// The scheduler calls this lazily, once per non-custom tween, and only when
/// begin and end differ.
pub trait InterpolatorFactory {
    fn interpolator(
        &self,
        begin: &Value,
        end: &Value,
        attribute: &str,
        namespace: Option<&str>,
    ) -> Result<Interpolator>;
}

impl<F> InterpolatorFactory for F
where
    F: Fn(&Value, &Value, &str, Option<&str>) -> Interpolator,
{
    fn interpolator(
        &self,
        begin: &Value,
        end: &Value,
        attribute: &str,
        namespace: Option<&str>,
    ) -> Result<Interpolator> {
        Ok(self(begin, end, attribute, namespace))
    }
}

/// Factory for entities that only use immediate sets and custom tweens.
///
/// Any request for an interpolator fails with `MissingInterpolator`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInterpolation;

impl InterpolatorFactory for NoInterpolation {
    fn interpolator(
        &self,
        _begin: &Value,
        _end: &Value,
        attribute: &str,
        namespace: Option<&str>,
    ) -> Result<Interpolator> {
        Err(TransitionError::MissingInterpolator {
            attribute: attribute.to_string(),
            namespace: namespace.map(str::to_string),
        })
    }
}

/// General-purpose interpolator selection.
///
/// - attribute `transform`: SVG transform decomposition
/// - numeric end: numeric lerp (a text begin is parsed as a number)
/// - both ends CSS colors: RGBA blend rendered as `rgb(..)`/`rgba(..)`
/// - other text: numbers embedded in the end string are blended from the
///   matching numbers of the begin string
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardInterpolator;

impl InterpolatorFactory for StandardInterpolator {
    fn interpolator(
        &self,
        begin: &Value,
        end: &Value,
        attribute: &str,
        _namespace: Option<&str>,
    ) -> Result<Interpolator> {
        if attribute == "transform" {
            let i = interpolate_transform_svg(&begin.to_string(), &end.to_string());
            return Ok(Box::new(move |t| Value::Text(i(t))));
        }

        Ok(interpolate_value(begin, end))
    }
}

/// Pick an interpolator from the value kinds alone.
pub fn interpolate_value(begin: &Value, end: &Value) -> Interpolator {
    match (begin, end) {
        (Value::Number(a), Value::Number(b)) => number(*a, *b),
        (Value::Text(a), Value::Number(b)) => match a.trim().parse::<f64>() {
            Ok(a) => number(a, *b),
            Err(_) => snap(begin.clone(), end.clone()),
        },
        (_, Value::Text(b)) => {
            let a = begin.to_string();
            match (parse_color(&a), parse_color(b)) {
                (Some(ca), Some(cb)) => {
                    Box::new(move |t| Value::Text(format_color(ca.interpolate(&cb, t))))
                }
                _ => interpolate_string(&a, b),
            }
        }
    }
}

fn number(a: f64, b: f64) -> Interpolator {
    Box::new(move |t| Value::Number(a.interpolate(&b, t)))
}

/// Hold the begin value until the end, then jump.
fn snap(begin: Value, end: Value) -> Interpolator {
    Box::new(move |t| if t >= 1.0 { end.clone() } else { begin.clone() })
}

/// RGBA in 0-255 channel space with 0-1 alpha.
fn parse_color(s: &str) -> Option<[f64; 4]> {
    // Bare hex digits ("add", "bead") are words, not colors.
    if s.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let c = csscolorparser::parse(s).ok()?;
    Some([
        c.r as f64 * 255.0,
        c.g as f64 * 255.0,
        c.b as f64 * 255.0,
        c.a as f64,
    ])
}

fn format_color(rgba: [f64; 4]) -> String {
    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    let (r, g, b) = (channel(rgba[0]), channel(rgba[1]), channel(rgba[2]));
    let a = rgba[3].clamp(0.0, 1.0);
    if a >= 1.0 {
        format!("rgb({r}, {g}, {b})")
    } else {
        format!("rgba({r}, {g}, {b}, {})", (a * 1000.0).round() / 1000.0)
    }
}

/// A numeric literal found in a string.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NumberSpan {
    start: usize,
    end: usize,
    value: f64,
}

/// Scan `s` for numeric literals (`-1.5`, `.5`, `2e3`).
fn scan_numbers(s: &str) -> Vec<NumberSpan> {
    let bytes = s.as_bytes();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let mut j = i;
        if bytes[j] == b'-' || bytes[j] == b'+' {
            j += 1;
        }
        let digits_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j < bytes.len() && bytes[j] == b'.' {
            j += 1;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
        }
        let mantissa = &s[digits_start..j];
        if mantissa.is_empty() || mantissa == "." {
            i = start + s[start..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        if j < bytes.len() && (bytes[j] == b'e' || bytes[j] == b'E') {
            let mut k = j + 1;
            if k < bytes.len() && (bytes[k] == b'-' || bytes[k] == b'+') {
                k += 1;
            }
            if k < bytes.len() && bytes[k].is_ascii_digit() {
                while k < bytes.len() && bytes[k].is_ascii_digit() {
                    k += 1;
                }
                j = k;
            }
        }
        if let Ok(value) = s[start..j].parse::<f64>() {
            spans.push(NumberSpan {
                start,
                end: j,
                value,
            });
        }
        i = j;
    }

    spans
}

/// Blend the numbers embedded in `to` from the matching numbers in `from`.
///
/// The text between numbers always comes from `to`; numbers in `to` without
/// a counterpart in `from` are held constant.
pub fn interpolate_string(from: &str, to: &str) -> Interpolator {
    let from_numbers = scan_numbers(from);
    let to_numbers = scan_numbers(to);
    let to = to.to_string();

    if to_numbers.is_empty() {
        return Box::new(move |_| Value::Text(to.clone()));
    }

    let pairs: Vec<(NumberSpan, f64)> = to_numbers
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let begin = from_numbers.get(i).map_or(span.value, |f| f.value);
            (*span, begin)
        })
        .collect();

    Box::new(move |t| {
        let mut out = String::with_capacity(to.len());
        let mut cursor = 0;
        for (span, begin) in &pairs {
            out.push_str(&to[cursor..span.start]);
            let v = begin.interpolate(&span.value, t);
            out.push_str(&format!("{}", (v * 1e6).round() / 1e6));
            cursor = span.end;
        }
        out.push_str(&to[cursor..]);
        Value::Text(out)
    })
}
