//! Colors and the palettes used to tell geometries apart
//!
//! Pure red is reserved for map geometry that has no match in the current
//! frame, so neither [`IdPalette`] nor [`distinct_colors`] ever produce a hue
//! in the red band `[340°, 20°)`.

use serde::{Deserialize, Serialize};

/// Start of the usable hue range, as a fraction of the hue circle
const RED_BAND_END: f32 = 20.0 / 360.0;
/// End of the usable hue range
const RED_BAND_START: f32 = 340.0 / 360.0;
const USABLE_HUE: f32 = RED_BAND_START - RED_BAND_END;

const GOLDEN_RATIO_CONJUGATE: f64 = 0.618033988749895;

/// Number of entries in the default id palette
pub const ID_PALETTE_SIZE: usize = 18;

/// Linear RGB color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);
    pub const RED: Rgb = Rgb::new(1.0, 0.0, 0.0);
    pub const GREEN: Rgb = Rgb::new(0.0, 1.0, 0.0);
    pub const GRAY: Rgb = Rgb::new(0.5, 0.5, 0.5);

    /// Map geometry with no counterpart in the frame
    pub const UNMATCHED: Rgb = Rgb::RED;
    /// Dense cloud when no per-point coloring applies
    pub const DENSE_DEFAULT: Rgb = Rgb::new(0.0, 0.0, 1.0);
    /// Dense point correspondence lines
    pub const MATCH_LINE: Rgb = Rgb::new(1.0, 1.0, 0.0);
    pub const AXIS_X: Rgb = Rgb::new(1.0, 0.2, 0.2);
    pub const AXIS_Y: Rgb = Rgb::new(0.2, 1.0, 0.2);
    pub const AXIS_Z: Rgb = Rgb::new(0.2, 0.4, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Convert from hue, saturation and value, each in `0.0..=1.0`
    pub fn from_hsv(h: f32, s: f32, v: f32) -> Self {
        if s <= 0.0 {
            return Self::new(v, v, v);
        }
        let h = h.rem_euclid(1.0) * 6.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match sector as u32 % 6 {
            0 => Self::new(v, t, p),
            1 => Self::new(q, v, p),
            2 => Self::new(p, v, t),
            3 => Self::new(p, q, v),
            4 => Self::new(t, p, v),
            _ => Self::new(v, p, q),
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_u8(self) -> [u8; 3] {
        let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [c(self.r), c(self.g), c(self.b)]
    }
}

impl From<[f32; 3]> for Rgb {
    fn from(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(c: Rgb) -> Self {
        c.to_array()
    }
}

/// Fixed set of colors assigned to ground and plane ids
#[derive(Debug, Clone)]
pub struct IdPalette {
    colors: Vec<Rgb>,
}

impl IdPalette {
    /// Spread `size` colors evenly across the non-red hues
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let colors = (0..size)
            .map(|i| {
                let hue = RED_BAND_END + (i as f32 / size as f32) * USABLE_HUE;
                Rgb::from_hsv(hue, 0.8, 0.9)
            })
            .collect();
        Self { colors }
    }

    /// Color for a geometry id. Ids wrap around the palette; negative ids are gray.
    pub fn color_for(&self, id: i64) -> Rgb {
        if id < 0 {
            return Rgb::GRAY;
        }
        self.colors[(id as usize) % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for IdPalette {
    fn default() -> Self {
        Self::new(ID_PALETTE_SIZE)
    }
}

/// One visually distinct, non-red color per point.
///
/// Hues step by the golden ratio so neighbouring indices land far apart.
/// Above 100 colors saturation and value also vary slightly.
pub fn distinct_colors(count: usize) -> Vec<Rgb> {
    const SATURATION: f32 = 0.8;
    const VALUE: f32 = 0.9;

    match count {
        0 => Vec::new(),
        1 => vec![Rgb::from_hsv(120.0 / 360.0, SATURATION, VALUE)],
        _ => (0..count)
            .map(|i| {
                let raw = ((i as f64 * GOLDEN_RATIO_CONJUGATE) % 1.0) as f32;
                let hue = remap_hue(raw);
                let (s, v) = if count > 100 {
                    (
                        SATURATION * (0.7 + 0.3 * (i % 3) as f32 / 2.0),
                        VALUE * (0.8 + 0.2 * (i % 5) as f32 / 4.0),
                    )
                } else {
                    (SATURATION, VALUE)
                };
                Rgb::from_hsv(hue, s, v)
            })
            .collect(),
    }
}

/// Move a raw hue in `[0, 1)` into the usable, non-red range
fn remap_hue(raw: f32) -> f32 {
    let half = USABLE_HUE / 2.0;
    let hue = if raw < RED_BAND_END {
        RED_BAND_END + (raw / RED_BAND_END) * half
    } else if raw > RED_BAND_START {
        RED_BAND_START - half + ((raw - RED_BAND_START) / (1.0 - RED_BAND_START)) * half
    } else {
        RED_BAND_END + ((raw - RED_BAND_END) / USABLE_HUE) * USABLE_HUE
    };
    hue.rem_euclid(1.0)
}
