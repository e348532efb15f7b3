//! Color utility functions for annotation display colors.

/// Hue step between consecutive generated colors (golden angle).
const HUE_STEP: f32 = 137.508;

/// Convert HSV to RGB.
///
/// # Arguments
/// * `h` - Hue in degrees (0-360)
/// * `s` - Saturation (0.0-1.0)
/// * `v` - Value/brightness (0.0-1.0)
///
/// # Returns
/// RGB tuple with values in range 0.0-1.0
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (r + m, g + m, b + m)
}

/// Format an RGB triple (0.0-1.0) as `#RRGGBB`.
pub fn to_hex(rgb: (f32, f32, f32)) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02X}{:02X}{:02X}",
        channel(rgb.0),
        channel(rgb.1),
        channel(rgb.2)
    )
}

/// Display color for the `index`-th shape, spread around the hue wheel.
pub fn distinct_color(index: usize) -> String {
    let hue = (index as f32 * HUE_STEP) % 360.0;
    to_hex(hsv_to_rgb(hue, 0.65, 0.95))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_to_rgb_red() {
        let (r, g, b) = hsv_to_rgb(0.0, 1.0, 1.0);
        assert!((r - 1.0).abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!(b.abs() < 0.01);
    }

    #[test]
    fn test_hsv_to_rgb_blue() {
        let (r, g, b) = hsv_to_rgb(240.0, 1.0, 1.0);
        assert!(r.abs() < 0.01);
        assert!(g.abs() < 0.01);
        assert!((b - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex((1.0, 0.0, 0.0)), "#FF0000");
        assert_eq!(to_hex((0.0, 1.0, 0.0)), "#00FF00");
    }

    #[test]
    fn test_distinct_colors_differ() {
        let a = distinct_color(0);
        let b = distinct_color(1);
        assert_ne!(a, b);
        assert_eq!(a.len(), 7);
        assert!(a.starts_with('#'));
    }
}
