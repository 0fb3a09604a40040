//! Presentation targets for finished frames.
//!
//! The [`Panel`] trait is the boundary to the physical matrix. The bundled
//! [`TerminalPanel`] draws the frame into a terminal, two pixel rows per text
//! row, using the upper half block with truecolor foreground/background.

use crate::canvas::FrameCanvas;
use crate::config::MatrixConfig;
use crate::pacer::FramePacer;
use async_trait::async_trait;
use embedded_graphics::pixelcolor::{Rgb888, RgbColor};
use std::fmt::Write as _;
use std::io::{self, Write};

/// A device that shows one frame at a time.
#[async_trait]
pub trait Panel: Send {
    /// Show `canvas`. Returns once the frame is on screen at the next refresh
    /// boundary; the caller may draw the next frame immediately after.
    async fn present(&mut self, canvas: &FrameCanvas) -> io::Result<()>;
}

/// Render a canvas as terminal text, starting with a cursor-home sequence.
///
/// In colour mode each character is `▀` with the upper pixel as foreground
/// and the lower pixel as background. In monochrome mode a character is `#`
/// when either of its two pixels is lit.
pub fn frame_text(canvas: &FrameCanvas, color: bool) -> String {
    let rows: Vec<&[Rgb888]> = canvas.rows().collect();
    let mut out = String::from("\x1b[H");
    for pair in rows.chunks(2) {
        let top = pair[0];
        let bottom = pair.get(1).copied();
        for (x, upper) in top.iter().enumerate() {
            let lower = bottom.and_then(|row| row.get(x)).copied().unwrap_or(Rgb888::BLACK);
            if color {
                let _ = write!(
                    out,
                    "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m▀",
                    upper.r(),
                    upper.g(),
                    upper.b(),
                    lower.r(),
                    lower.g(),
                    lower.b()
                );
            } else if *upper != Rgb888::BLACK || lower != Rgb888::BLACK {
                out.push('#');
            } else {
                out.push(' ');
            }
        }
        if color {
            out.push_str("\x1b[0m");
        }
        out.push('\n');
    }
    out
}

/// Terminal stand-in for the LED matrix, paced at the matrix refresh rate.
pub struct TerminalPanel<W: Write + Send> {
    out: W,
    color: bool,
    pacer: FramePacer,
}

impl TerminalPanel<io::Stdout> {
    pub fn stdout(config: &MatrixConfig) -> Self {
        Self::new(io::stdout(), config)
    }
}

impl<W: Write + Send> TerminalPanel<W> {
    pub fn new(out: W, config: &MatrixConfig) -> Self {
        Self {
            out,
            color: config.color,
            pacer: FramePacer::new(config.refresh_rate_hz),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: Write + Send> Panel for TerminalPanel<W> {
    async fn present(&mut self, canvas: &FrameCanvas) -> io::Result<()> {
        let frame = frame_text(canvas, self.color);
        self.pacer.wait().await;
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }
}
