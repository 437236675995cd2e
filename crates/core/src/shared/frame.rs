use ndarray::ArrayView3;

/// A single video frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Extracts the region under `bbox`, clamped to frame bounds.
    ///
    /// Returns `None` when the clamped region has zero width or height.
    pub fn crop(&self, bbox: &[f64; 4]) -> Option<Frame> {
        let x1 = bbox[0].max(0.0) as u32;
        let y1 = bbox[1].max(0.0) as u32;
        let x2 = bbox[2].clamp(0.0, self.width as f64) as u32;
        let y2 = bbox[3].clamp(0.0, self.height as f64) as u32;
        if x2 <= x1 || y2 <= y1 || x1 >= self.width || y1 >= self.height {
            return None;
        }

        let ch = self.channels as usize;
        let crop_w = (x2 - x1) as usize;
        let mut data = Vec::with_capacity((y2 - y1) as usize * crop_w * ch);
        for y in y1..y2 {
            let row_start = (y as usize * self.width as usize + x1 as usize) * ch;
            data.extend_from_slice(&self.data[row_start..row_start + crop_w * ch]);
        }
        Some(Frame::new(data, x2 - x1, y2 - y1, self.channels, self.index))
    }

    /// Downscales to `target_width` (aspect preserved) via nearest sampling.
    ///
    /// Frames at or below the target are returned unchanged.
    pub fn resize_to_width(&self, target_width: u32) -> Frame {
        if self.width <= target_width {
            return self.clone();
        }
        let scale = target_width as f64 / self.width as f64;
        let target_height = ((self.height as f64 * scale) as u32).max(1);

        let ch = self.channels as usize;
        let src_w = self.width as usize;
        let mut data = Vec::with_capacity(target_width as usize * target_height as usize * ch);
        for y in 0..target_height as usize {
            let src_y = (((y as f64 + 0.5) / scale) as usize).min(self.height as usize - 1);
            for x in 0..target_width as usize {
                let src_x = (((x as f64 + 0.5) / scale) as usize).min(src_w - 1);
                let offset = (src_y * src_w + src_x) * ch;
                data.extend_from_slice(&self.data[offset..offset + ch]);
            }
        }
        Frame::new(data, target_width, target_height, self.channels, self.index)
    }

    /// Per-pixel luma (BT.601 weights) for sharpness analysis.
    pub fn grayscale(&self) -> Vec<u8> {
        if self.channels == 1 {
            return self.data.clone();
        }
        let ch = self.channels as usize;
        self.data
            .chunks_exact(ch)
            .map(|px| {
                (0.299 * px[0] as f64 + 0.587 * px[1] as f64 + 0.114 * px[2] as f64) as u8
            })
            .collect()
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(w: u32, h: u32) -> Frame {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for y in 0..h {
            for x in 0..w {
                let v = ((x + y) % 256) as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, w, h, 3, 0)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = gradient_frame(4, 2);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]);
    }

    #[test]
    fn test_crop_interior() {
        let frame = gradient_frame(10, 10);
        let crop = frame.crop(&[2.0, 3.0, 7.0, 8.0]).unwrap();
        assert_eq!(crop.width(), 5);
        assert_eq!(crop.height(), 5);
        // Top-left crop pixel is source pixel (2, 3)
        assert_eq!(crop.data()[0], 5);
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let frame = gradient_frame(10, 10);
        let crop = frame.crop(&[-5.0, -5.0, 20.0, 20.0]).unwrap();
        assert_eq!(crop.width(), 10);
        assert_eq!(crop.height(), 10);
    }

    #[test]
    fn test_crop_outside_frame_is_none() {
        let frame = gradient_frame(10, 10);
        assert!(frame.crop(&[20.0, 20.0, 30.0, 30.0]).is_none());
        assert!(frame.crop(&[-10.0, -10.0, -1.0, -1.0]).is_none());
    }

    #[test]
    fn test_crop_zero_area_is_none() {
        let frame = gradient_frame(10, 10);
        assert!(frame.crop(&[4.0, 4.0, 4.0, 9.0]).is_none());
        assert!(frame.crop(&[6.0, 6.0, 3.0, 9.0]).is_none());
    }

    #[test]
    fn test_resize_halves_dimensions() {
        let frame = gradient_frame(100, 60);
        let resized = frame.resize_to_width(50);
        assert_eq!(resized.width(), 50);
        assert_eq!(resized.height(), 30);
    }

    #[test]
    fn test_resize_noop_when_already_narrow() {
        let frame = gradient_frame(40, 30);
        let resized = frame.resize_to_width(100);
        assert_eq!(resized.width(), 40);
        assert_eq!(resized.height(), 30);
        assert_eq!(resized.data(), frame.data());
    }

    #[test]
    fn test_grayscale_length_and_weights() {
        let data = vec![255, 0, 0, 0, 255, 0]; // one red, one green pixel
        let frame = Frame::new(data, 2, 1, 3, 0);
        let gray = frame.grayscale();
        assert_eq!(gray.len(), 2);
        assert_eq!(gray[0], 76); // 0.299 * 255
        assert_eq!(gray[1], 149); // 0.587 * 255
    }

    #[test]
    fn test_grayscale_single_channel_passthrough() {
        let frame = Frame::new(vec![7, 9], 2, 1, 1, 0);
        assert_eq!(frame.grayscale(), vec![7, 9]);
    }
}
