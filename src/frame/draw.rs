//! Drawing primitives

use super::PixelFrame;
use crate::color::Color;

impl PixelFrame {
    /// Bresenham line between two points, both ends included
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: impl Into<Color>) {
        let color = color.into();

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };

        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;

        loop {
            self.set(x, y, color);

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Outline of a `width` x `height` rectangle
    pub fn draw_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: impl Into<Color>) {
        if width <= 0 || height <= 0 {
            return;
        }

        let color = color.into();
        let (x1, y1) = (x + width - 1, y + height - 1);

        self.draw_line(x, y, x1, y, color);
        self.draw_line(x, y1, x1, y1, color);
        self.draw_line(x, y, x, y1, color);
        self.draw_line(x1, y, x1, y1, color);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: impl Into<Color>) {
        let color = color.into();

        for yy in y..y + height {
            for xx in x..x + width {
                self.set(xx, yy, color);
            }
        }
    }

    /// Midpoint circle outline
    pub fn draw_circle(&mut self, cx: i32, cy: i32, radius: i32, color: impl Into<Color>) {
        if radius < 0 {
            return;
        }

        let color = color.into();
        let (mut x, mut y) = (radius, 0);
        let mut err = 1 - radius;

        while x >= y {
            for &(px, py) in &[
                (x, y),
                (y, x),
                (-y, x),
                (-x, y),
                (-x, -y),
                (-y, -x),
                (y, -x),
                (x, -y),
            ] {
                self.set(cx + px, cy + py, color);
            }

            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;

    fn lit(frame: &PixelFrame) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..frame.height() as i32 {
            for x in 0..frame.width() as i32 {
                if !frame.get(x, y).is_black() {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_line() {
        let mut frame = PixelFrame::new(4, 4, Color::BLACK);
        frame.draw_line(0, 0, 3, 3, Rgb::WHITE);
        assert_eq!(lit(&frame), vec![(0, 0), (1, 1), (2, 2), (3, 3)]);

        let mut frame = PixelFrame::new(4, 2, Color::BLACK);
        frame.draw_line(3, 1, 0, 1, Rgb::WHITE);
        assert_eq!(lit(&frame), vec![(0, 1), (1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn test_line_is_clipped() {
        let mut frame = PixelFrame::new(2, 2, Color::BLACK);
        frame.draw_line(-5, 0, 5, 0, Rgb::WHITE);
        assert_eq!(lit(&frame), vec![(0, 0), (1, 0)]);
    }

    #[test]
    fn test_rects() {
        let mut frame = PixelFrame::new(4, 4, Color::BLACK);
        frame.draw_rect(0, 0, 3, 3, Rgb::WHITE);
        assert_eq!(lit(&frame).len(), 8);
        assert!(frame.get(1, 1).is_black());

        frame.fill_rect(1, 1, 3, 3, Rgb::WHITE);
        assert_eq!(lit(&frame).len(), 14);
    }

    #[test]
    fn test_circle_is_symmetric() {
        let mut frame = PixelFrame::new(9, 9, Color::BLACK);
        frame.draw_circle(4, 4, 3, Rgb::WHITE);

        assert!(!frame.get(4, 1).is_black());
        assert!(!frame.get(7, 4).is_black());
        assert!(frame.get(4, 4).is_black());
        assert_eq!(frame, frame.rotate_180());
        assert_eq!(frame, frame.rotate_left());
    }
}
