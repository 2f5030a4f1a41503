use std::io::Write;

use crate::grab::convert::NUM_COLORS;

/// Row alignment of a display image, in bytes.
const ROW_ALIGNMENT: usize = 4;

/// A 3-channel 8-bit BGR bitmap with padded rows.
///
/// Rows start every `pitch` bytes; the `pitch - width * 3` trailing bytes
/// of each row are padding and never carry pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    width: u32,
    height: u32,
    pitch: usize,
    data: Vec<u8>,
}

impl DisplayImage {
    /// Allocate a zeroed image with a 4-byte aligned pitch.
    pub fn new(width: u32, height: u32) -> Self {
        let row_width = width as usize * NUM_COLORS;
        let pitch = row_width.div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT;
        Self::alloc(width, height, pitch)
    }

    /// Allocate an image with an explicit pitch. `None` if the pitch cannot
    /// hold a row.
    pub fn with_pitch(width: u32, height: u32, pitch: usize) -> Option<Self> {
        if pitch < width as usize * NUM_COLORS {
            return None;
        }
        Some(Self::alloc(width, height, pitch))
    }

    fn alloc(width: u32, height: u32, pitch: usize) -> Self {
        Self {
            width,
            height,
            pitch,
            data: vec![0; pitch * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Distance in bytes between the starts of consecutive rows.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Pixel bytes per row, excluding padding.
    pub fn row_width(&self) -> usize {
        self.width as usize * NUM_COLORS
    }

    /// Whether the image has any pixels to copy into.
    pub fn is_allocated(&self) -> bool {
        !self.data.is_empty()
    }

    /// Whole backing buffer, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.pitch;
        Some(&self.data[start..start + self.row_width()])
    }

    /// Write the image as a binary PPM (P6, RGB order).
    pub fn write_ppm<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", self.width, self.height)?;
        let mut rgb = Vec::with_capacity(self.row_width());
        for y in 0..self.height {
            let Some(row) = self.row(y) else { break };
            rgb.clear();
            for px in row.chunks_exact(NUM_COLORS) {
                rgb.extend_from_slice(&[px[2], px[1], px[0]]);
            }
            out.write_all(&rgb)?;
        }
        out.flush()
    }
}

/// Copy packed BGR rows from `src` into `dest`, honouring its pitch.
///
/// Bulk copy when the pitch equals the row width, otherwise row by row,
/// leaving the padding bytes untouched. Absent or empty destinations are
/// ignored.
pub fn copy_to_image(src: &[u8], dest: Option<&mut DisplayImage>) {
    let Some(image) = dest else {
        return;
    };
    if !image.is_allocated() {
        return;
    }

    let row_width = image.row_width();
    let pitch = image.pitch();
    let data = image.as_bytes_mut();

    if pitch == row_width {
        let n = src.len().min(data.len());
        data[..n].copy_from_slice(&src[..n]);
        return;
    }

    if row_width == 0 {
        return;
    }
    for (src_row, dst_row) in src.chunks(row_width).zip(data.chunks_mut(pitch)) {
        dst_row[..src_row.len()].copy_from_slice(src_row);
    }
}
