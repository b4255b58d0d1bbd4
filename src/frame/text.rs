use super::PixelFrame;
use crate::color::Color;

/// Font backend rendering a line of text into a frame
pub trait TextRasterizer {
    fn rasterize(&self, text: &str, background: Color, foreground: Color) -> PixelFrame;
}

impl PixelFrame {
    pub fn from_text(
        rasterizer: &dyn TextRasterizer,
        text: &str,
        background: impl Into<Color>,
        foreground: impl Into<Color>,
    ) -> Self {
        rasterizer.rasterize(text, background.into(), foreground.into())
    }

    /// Render several differently colored texts next to each other
    pub fn from_texts(rasterizer: &dyn TextRasterizer, texts: &[(&str, Color, Color)]) -> Self {
        let frames: Vec<_> = texts
            .iter()
            .map(|(text, background, foreground)| {
                rasterizer.rasterize(text, *background, *foreground)
            })
            .collect();

        Self::join(&frames)
    }
}
