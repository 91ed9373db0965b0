//! Chart rendering seam.
//!
//! Plotting is out of scope for the core; renderers receive finished
//! [`BookingCurve`]s and decide how to draw or export them.

use crate::curve::BookingCurve;
use curve_core::Result;
use std::io::Write;

/// Consumer of booking curves.
pub trait ChartRenderer {
    /// Render one curve.
    fn render(&mut self, curve: &BookingCurve) -> Result<()>;
}

/// Render every curve in order. Returns the number rendered.
pub fn render_all<R>(renderer: &mut R, curves: &[BookingCurve]) -> Result<usize>
where
    R: ChartRenderer + ?Sized,
{
    for curve in curves {
        renderer.render(curve)?;
    }
    Ok(curves.len())
}

/// Writes each curve as one JSON object per line.
pub struct JsonLinesRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartRenderer for JsonLinesRenderer<W> {
    fn render(&mut self, curve: &BookingCurve) -> Result<()> {
        serde_json::to_writer(&mut self.out, curve)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}
