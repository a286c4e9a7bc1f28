//! Editing of inline CSS `transform` values
//!
//! Leaflet positions every tile with `translate3d(x, y, 0px)` before it is
//! inserted. Downgraded tiles keep that translation, shifted by the
//! compensation offset, and gain a trailing `scale(n)`.

const TRANSLATE_3D: &str = "translate3d(";
const SCALE: &str = "scale(";

/// Shift the first `translate3d()` of `transform` by `(dx, dy)` pixels.
///
/// The z component is reset to `0px`. Returns `None` when there is no
/// translation, or its x/y components are not plain pixel lengths.
pub fn shift_translate3d(transform: &str, dx: f64, dy: f64) -> Option<String> {
    let start = transform.find(TRANSLATE_3D)?;
    let args_start = start + TRANSLATE_3D.len();
    let end = args_start + transform[args_start..].find(')')?;

    let mut args = transform[args_start..end].splitn(3, ',');
    let tx = parse_px(args.next()?)?;
    let ty = parse_px(args.next()?)?;
    args.next()?;

    Some(format!(
        "{}translate3d({}px, {}px, 0px){}",
        &transform[..start],
        tx + dx,
        ty + dy,
        &transform[end + 1..]
    ))
}

/// Append `scale(scale)` unless the transform already carries a scale.
pub fn with_scale(transform: &str, scale: u32) -> String {
    if transform.contains(SCALE) {
        return transform.to_string();
    }
    let transform = transform.trim_end();
    if transform.is_empty() {
        format!("scale({})", scale)
    } else {
        format!("{} scale({})", transform, scale)
    }
}

/// Parse a CSS length in pixels; unitless values are accepted as pixels.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim_end();
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_translate3d() {
        assert_eq!(
            shift_translate3d("translate3d(512px, 256px, 0px)", -256.0, -64.0).as_deref(),
            Some("translate3d(256px, 192px, 0px)")
        );
        assert_eq!(
            shift_translate3d("translate3d(10.5px,-3px,0) rotate(0deg)", 0.0, 0.0).as_deref(),
            Some("translate3d(10.5px, -3px, 0px) rotate(0deg)")
        );
    }

    #[test]
    fn test_shift_without_translation() {
        assert_eq!(shift_translate3d("", -256.0, 0.0), None);
        assert_eq!(shift_translate3d("translate(10px, 10px)", -256.0, 0.0), None);
        assert_eq!(shift_translate3d("translate3d(1em, 2px, 0px)", -256.0, 0.0), None);
        assert_eq!(shift_translate3d("translate3d(1px, 2px)", -256.0, 0.0), None);
    }

    #[test]
    fn test_with_scale() {
        assert_eq!(with_scale("", 4), "scale(4)");
        assert_eq!(
            with_scale("translate3d(0px, 0px, 0px)", 2),
            "translate3d(0px, 0px, 0px) scale(2)"
        );
        assert_eq!(with_scale("translate3d(0px, 0px, 0px) scale(8)", 2), "translate3d(0px, 0px, 0px) scale(8)");
    }

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px(" 12px"), Some(12.0));
        assert_eq!(parse_px("-0.5"), Some(-0.5));
        assert_eq!(parse_px("auto"), None);
    }
}
