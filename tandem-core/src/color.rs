//! Scene background specification.

/// Straight-alpha RGBA color, each channel in [0.0, 1.0].
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a `0xAARRGGBB` value.
    pub fn from_argb(argb: u32) -> Self {
        let channel = |shift: u32| ((argb >> shift) & 0xFF) as f32 / 255.0;
        Self {
            a: channel(24),
            r: channel(16),
            g: channel(8),
            b: channel(0),
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A parsed background: a clear color plus whether to draw the
/// transparency checkerboard underneath.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Background {
    pub color: Color,
    pub pattern: bool,
}

impl Background {
    pub const TRANSPARENT: Background = Background {
        color: Color::TRANSPARENT,
        pattern: true,
    };

    pub fn solid(color: Color) -> Self {
        Self {
            color,
            pattern: false,
        }
    }

    /// Parse `"transparent"` or `#AARRGGBB`.
    ///
    /// Anything else yields a zero color with the pattern disabled.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("transparent") {
            return Self::TRANSPARENT;
        }
        match parse_hex_argb(spec) {
            Some(argb) => Self::solid(Color::from_argb(argb)),
            None => {
                log::warn!("Unrecognized background {spec:?}; using a zero color");
                Self::default()
            }
        }
    }
}

fn parse_hex_argb(spec: &str) -> Option<u32> {
    let digits = spec.strip_prefix('#')?;
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}
