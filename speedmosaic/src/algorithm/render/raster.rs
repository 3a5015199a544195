use super::color_scale::Rgb;
use font8x8::{UnicodeFonts, BASIC_FONTS};

/// width and height of a glyph in pixels
pub const GLYPH_SIZE: u32 = 8;

/// placement of the mosaic grid within the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub origin_x: u32,
    pub origin_y: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl GridLayout {
    pub fn width(&self) -> u32 {
        self.cell_width * self.columns
    }

    pub fn height(&self) -> u32 {
        self.cell_height * self.rows
    }

    /// top left pixel of a cell
    pub fn cell_origin(&self, column: u32, row: u32) -> (u32, u32) {
        (
            self.origin_x + column * self.cell_width,
            self.origin_y + row * self.cell_height,
        )
    }
}

/// an 8-bit RGB image held in memory, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicRaster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub grid: GridLayout,
}

impl MosaicRaster {
    pub fn new(width: u32, height: u32, background: Rgb, grid: GridLayout) -> MosaicRaster {
        let pixels = background
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        MosaicRaster {
            width,
            height,
            pixels,
            grid,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// writes a pixel; coordinates outside the raster are clipped.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[i..i + 3].copy_from_slice(&color);
    }

    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgb) {
        for py in y..y.saturating_add(height).min(self.height) {
            for px in x..x.saturating_add(width).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// draws a single line of text with its top left corner at (x, y). characters
    /// without a glyph are drawn as '?'. returns the x position after the text.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, color: Rgb) -> u32 {
        let mut cursor = x;
        for c in text.chars() {
            let glyph = BASIC_FONTS
                .get(c)
                .or_else(|| BASIC_FONTS.get('?'))
                .unwrap_or([0; 8]);
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if bits & (1 << col) != 0 {
                        self.set_pixel(cursor + col, y + row as u32, color);
                    }
                }
            }
            cursor = cursor.saturating_add(GLYPH_SIZE);
        }
        cursor
    }
}

/// width in pixels of a line of text
pub fn text_width(text: &str) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridLayout {
        GridLayout {
            origin_x: 0,
            origin_y: 0,
            cell_width: 1,
            cell_height: 1,
            columns: 1,
            rows: 1,
        }
    }

    #[test]
    fn test_fill_clips() {
        let mut raster = MosaicRaster::new(4, 3, [0, 0, 0], grid());
        raster.fill_rect(2, 1, 10, 10, [9, 8, 7]);
        assert_eq!(raster.pixel(3, 2), Some([9, 8, 7]));
        assert_eq!(raster.pixel(1, 1), Some([0, 0, 0]));
        assert_eq!(raster.pixel(4, 0), None);
        assert_eq!(raster.pixels.len(), 36);
    }

    #[test]
    fn test_non_ascii_draws_placeholder() {
        let mut ascii = MosaicRaster::new(8, 8, [255, 255, 255], grid());
        ascii.draw_text(0, 0, "?", [0, 0, 0]);
        let mut other = MosaicRaster::new(8, 8, [255, 255, 255], grid());
        let end = other.draw_text(0, 0, "\u{6771}", [0, 0, 0]);
        assert_eq!(end, 8);
        assert_eq!(ascii, other);
    }
}
