//! Encoded-polyline codec.
//!
//! The standard Google polyline format: coordinate differences in units of
//! 1e-5 degrees, zig-zag signed, split into 5-bit groups with a continuation
//! bit on all but the last, each byte offset by +63 into printable ASCII.
//!
//! Decoding is total: malformed input yields an empty sequence rather than
//! an error, and the caller falls back to a straight-line geometry.

use crate::models::Point;

/// Decodes an encoded polyline into a sequence of points.
///
/// Returns an empty vector if the input is malformed (a byte below the +63
/// offset, a value truncated mid-chunk, or a latitude without a matching
/// longitude).
///
/// # Examples
///
/// ```
/// use busroute::geo::polyline;
///
/// let points = polyline::decode("_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// assert_eq!(points.len(), 3);
/// assert!((points[0].lat - 38.5).abs() < 1e-9);
/// assert!((points[0].lng + 120.2).abs() < 1e-9);
///
/// assert!(polyline::decode("not a polyline!").is_empty());
/// ```
pub fn decode(encoded: &str) -> Vec<Point> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat = 0i64;
    let mut lng = 0i64;

    while index < bytes.len() {
        let Some(dlat) = next_value(bytes, &mut index) else {
            return Vec::new();
        };
        let Some(dlng) = next_value(bytes, &mut index) else {
            return Vec::new();
        };
        lat += dlat;
        lng += dlng;
        points.push(Point::new(lat as f64 / 1e5, lng as f64 / 1e5));
    }

    points
}

/// Encodes a sequence of points into the canonical polyline string.
pub fn encode(points: &[Point]) -> String {
    let mut out = String::new();
    let mut prev_lat = 0i64;
    let mut prev_lng = 0i64;

    for p in points {
        let lat = (p.lat * 1e5).round() as i64;
        let lng = (p.lng * 1e5).round() as i64;
        push_value(lat - prev_lat, &mut out);
        push_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

/// Reads one zig-zag value starting at `*index`, advancing past it.
///
/// `None` on truncation, a byte below the offset, or chunk overflow.
fn next_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result = 0i64;
    let mut shift = 0u32;

    loop {
        let b = *bytes.get(*index)?;
        if b < 63 || shift > 60 {
            return None;
        }
        *index += 1;
        let chunk = i64::from(b - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Some(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

fn push_value(value: i64, out: &mut String) {
    let mut v = if value < 0 {
        !(value << 1)
    } else {
        value << 1
    };
    while v >= 0x20 {
        out.push((((v & 0x1f) | 0x20) as u8 + 63) as char);
        v >>= 5;
    }
    out.push((v as u8 + 63) as char);
}
