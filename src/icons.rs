//! 8x8 weather icons.
//!
//! Each [`WeatherType`] has one bitmap written as ASCII art. A character picks
//! the colour of its pixel:
//!
//! | char | colour      |
//! |------|-------------|
//! | `.`  | off         |
//! | `Y`  | sun         |
//! | `W`  | cloud       |
//! | `G`  | storm cloud |
//! | `B`  | rain        |
//! | `S`  | snow        |
//! | `I`  | ice         |
//! | `L`  | lightning   |
//!
//! The forecast strip blits icons at scale 1, current conditions at scale 2.

use crate::canvas::{FrameCanvas, RenderError};
use crate::WeatherType;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};

/// Side length of an unscaled icon, in pixels.
pub const ICON_SIZE: usize = 8;

type Bitmap = [&'static str; ICON_SIZE];

const SUN: Bitmap = [
    "...Y....",
    ".Y.Y.Y..",
    "..YYY...",
    "YYYYYYY.",
    "..YYY...",
    ".Y.Y.Y..",
    "...Y....",
    "........",
];

const PARTLY_CLOUDY: Bitmap = [
    ".Y.Y....",
    "..YYY...",
    "YYYYWW..",
    "..YWWWW.",
    ".WWWWWWW",
    "WWWWWWWW",
    ".WWWWWW.",
    "........",
];

const MOSTLY_CLOUDY: Bitmap = [
    "..Y.....",
    ".YYWW...",
    "YYWWWWW.",
    ".WWWWWWW",
    "WWWWWWWW",
    "WWWWWWWW",
    ".WWWWWW.",
    "........",
];

const CLOUD: Bitmap = [
    "........",
    "...WW...",
    "..WWWW..",
    ".WWWWWW.",
    "WWWWWWWW",
    "WWWWWWWW",
    ".WWWWWW.",
    "........",
];

const LIGHT_RAIN: Bitmap = [
    "...WW...",
    "..WWWW..",
    ".WWWWWW.",
    "WWWWWWWW",
    ".WWWWWW.",
    "........",
    ".B...B..",
    "...B....",
];

const RAIN: Bitmap = [
    "...GG...",
    "..GGGG..",
    ".GGGGGG.",
    "GGGGGGGG",
    ".GGGGGG.",
    "B.B.B.B.",
    ".B.B.B.B",
    "B.B.B.B.",
];

const LIGHT_FLURRIES: Bitmap = [
    "...WW...",
    "..WWWW..",
    ".WWWWWW.",
    "WWWWWWWW",
    ".WWWWWW.",
    "........",
    ".S...S..",
    "...S....",
];

const SNOW: Bitmap = [
    "...WW...",
    "..WWWW..",
    ".WWWWWW.",
    "WWWWWWWW",
    ".WWWWWW.",
    "S.S.S.S.",
    ".S.S.S.S",
    "S.S.S.S.",
];

const FREEZING_RAIN: Bitmap = [
    "...GG...",
    "..GGGG..",
    ".GGGGGG.",
    "GGGGGGGG",
    ".GGGGGG.",
    "B.I.B.I.",
    ".I.B.I.B",
    "B.I.B.I.",
];

const RAIN_SNOW: Bitmap = [
    "...WW...",
    "..WWWW..",
    ".WWWWWW.",
    "WWWWWWWW",
    ".WWWWWW.",
    "B.S.B.S.",
    ".S.B.S.B",
    "B.S.B.S.",
];

const THUNDERSHOWERS: Bitmap = [
    "...GG...",
    "..GGGG..",
    ".GGGGGG.",
    "GGGGGGGG",
    ".GGLGGG.",
    "B.LL.B..",
    "...L..B.",
    "..L.....",
];

const UNKNOWN: Bitmap = [
    "..WWWW..",
    ".WW..WW.",
    ".....WW.",
    "....WW..",
    "...WW...",
    "...WW...",
    "........",
    "...WW...",
];

/// ASCII-art bitmap for a condition.
pub fn bitmap(weather: WeatherType) -> &'static Bitmap {
    match weather {
        WeatherType::Sun => &SUN,
        WeatherType::PartlyCloudy => &PARTLY_CLOUDY,
        WeatherType::MostlyCloudy => &MOSTLY_CLOUDY,
        WeatherType::Cloud => &CLOUD,
        WeatherType::LightRain => &LIGHT_RAIN,
        WeatherType::Rain => &RAIN,
        WeatherType::LightFlurries => &LIGHT_FLURRIES,
        WeatherType::Snow => &SNOW,
        WeatherType::FreezingRain => &FREEZING_RAIN,
        WeatherType::RainSnow => &RAIN_SNOW,
        WeatherType::Thundershowers => &THUNDERSHOWERS,
        WeatherType::Unknown => &UNKNOWN,
    }
}

fn color_for(ch: u8) -> Rgb888 {
    match ch {
        b'Y' => Rgb888::new(255, 200, 0),
        b'W' => Rgb888::new(200, 200, 200),
        b'G' => Rgb888::new(110, 110, 120),
        b'B' => Rgb888::new(0, 120, 255),
        b'S' => Rgb888::new(255, 255, 255),
        b'I' => Rgb888::new(150, 230, 255),
        b'L' => Rgb888::new(255, 255, 80),
        _ => Rgb888::BLACK,
    }
}

/// Row-major pixels of the icon, each bitmap pixel repeated `scale` times in
/// both directions. The result is `(8 * scale)²` long.
pub fn pixels(weather: WeatherType, scale: usize) -> Vec<Rgb888> {
    let scale = scale.max(1);
    let side = ICON_SIZE * scale;
    let mut out = Vec::with_capacity(side * side);
    for row in bitmap(weather) {
        let bytes = row.as_bytes();
        for _ in 0..scale {
            for col in 0..ICON_SIZE {
                let color = color_for(bytes.get(col).copied().unwrap_or(b'.'));
                out.extend(std::iter::repeat(color).take(scale));
            }
        }
    }
    out
}

/// Blit an icon with its top-left corner at `(x, y)`.
pub fn draw(
    canvas: &mut FrameCanvas,
    x: i32,
    y: i32,
    weather: WeatherType,
    scale: usize,
) -> Result<(), RenderError> {
    let side = (ICON_SIZE * scale.max(1)) as u32;
    canvas.blit_image(x, y, &pixels(weather, scale), side, side)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WeatherType; 12] = [
        WeatherType::Sun,
        WeatherType::PartlyCloudy,
        WeatherType::MostlyCloudy,
        WeatherType::LightFlurries,
        WeatherType::Snow,
        WeatherType::Cloud,
        WeatherType::LightRain,
        WeatherType::Rain,
        WeatherType::FreezingRain,
        WeatherType::RainSnow,
        WeatherType::Thundershowers,
        WeatherType::Unknown,
    ];

    #[test]
    fn bitmaps_are_square_and_use_the_palette() {
        for weather in ALL {
            for row in bitmap(weather) {
                assert_eq!(row.len(), ICON_SIZE, "{:?} row {row:?}", weather);
                assert!(row.chars().all(|c| ".YWGBSIL".contains(c)));
            }
        }
    }

    #[test]
    fn every_icon_lights_something() {
        for weather in ALL {
            assert!(pixels(weather, 1).iter().any(|&p| p != Rgb888::BLACK));
        }
    }

    #[test]
    fn scaling_repeats_pixels() {
        let small = pixels(WeatherType::Sun, 1);
        let large = pixels(WeatherType::Sun, 2);
        assert_eq!(small.len(), 64);
        assert_eq!(large.len(), 256);
        // Top of the sun's vertical ray is at column 3 of row 0.
        assert_eq!(small[3], Rgb888::new(255, 200, 0));
        assert_eq!(large[6], small[3]);
        assert_eq!(large[7], small[3]);
        assert_eq!(large[16 + 6], small[3]);
    }

    #[test]
    fn draw_fits_canvas() {
        let mut canvas = FrameCanvas::new(20, 20);
        draw(&mut canvas, 1, 1, WeatherType::Rain, 2).unwrap();
        assert!(canvas.lit_pixels() > 0);
        assert_eq!(canvas.pixel(0, 0), Some(Rgb888::BLACK));
    }
}
