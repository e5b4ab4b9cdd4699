use super::canvas::{Canvas, Hsl};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, swept 0..360 across the spectrum.
    pub hue: f32,
}

impl BarRect {
    pub fn color(&self) -> Hsl {
        Hsl::new(self.hue, 1.0, 0.5)
    }
}

const WAVEFORM_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Spectrum bar painter. Holds no per-frame state: every draw reads the
/// canvas size afresh and repaints the whole surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameRenderer {
    pub waveform_overlay: bool,
}

impl FrameRenderer {
    pub fn new(waveform_overlay: bool) -> Self {
        Self { waveform_overlay }
    }

    pub fn draw(&self, canvas: &mut dyn Canvas, bin_count: usize, frequencies: &[u8], times: &[u8]) {
        let width = canvas.width() as f32;
        let height = canvas.height() as f32;

        canvas.clear();
        for bar in bar_layout(bin_count, frequencies, width, height) {
            canvas.fill_rect(bar.x, bar.y, bar.width, bar.height, bar.color().to_rgba());
        }

        if self.waveform_overlay {
            let points = waveform_points(bin_count, times, width, height);
            for pair in points.windows(2) {
                canvas.line(pair[0], pair[1], WAVEFORM_COLOR);
            }
        }
    }
}

/// Geometry of every bar for one frame.
pub fn bar_layout(bin_count: usize, frequencies: &[u8], width: f32, height: f32) -> Vec<BarRect> {
    if bin_count == 0 {
        return Vec::new();
    }
    let bar_width = width / bin_count as f32;

    frequencies
        .iter()
        .take(bin_count)
        .enumerate()
        .map(|(i, &value)| {
            let percent = value as f32 / 255.0;
            let bar_height = height * percent;
            BarRect {
                x: i as f32 * bar_width,
                y: height - bar_height,
                width: bar_width,
                height: bar_height,
                hue: i as f32 / bin_count as f32 * 360.0,
            }
        })
        .collect()
}

/// Oscilloscope trace across the full width, 128 on the vertical midline.
pub fn waveform_points(bin_count: usize, times: &[u8], width: f32, height: f32) -> Vec<(f32, f32)> {
    let n = bin_count.min(times.len());
    if n < 2 {
        return Vec::new();
    }
    let step = width / (n - 1) as f32;
    times
        .iter()
        .take(n)
        .enumerate()
        .map(|(i, &v)| (i as f32 * step, height - v as f32 / 255.0 * height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Op {
        Clear,
        Fill(f32, f32, f32, f32, [u8; 4]),
        Line,
    }

    struct RecordingCanvas {
        width: u32,
        height: u32,
        ops: Vec<Op>,
    }

    impl RecordingCanvas {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                ops: Vec::new(),
            }
        }
    }

    impl Canvas for RecordingCanvas {
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }
        fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 4]) {
            self.ops.push(Op::Fill(x, y, width, height, color));
        }
        fn line(&mut self, _from: (f32, f32), _to: (f32, f32), _color: [u8; 4]) {
            self.ops.push(Op::Line);
        }
    }

    #[test]
    fn four_bar_geometry() {
        let bars = bar_layout(4, &[255, 128, 0, 64], 400.0, 100.0);
        assert_eq!(bars.len(), 4);
        assert!(bars.iter().all(|b| b.width == 100.0));

        assert_eq!(bars[0].height, 100.0);
        assert_eq!(bars[0].y, 0.0);
        assert_eq!(bars[2].height, 0.0);
        assert_eq!(bars[2].y, 100.0);
        assert!((bars[1].height - 100.0 * 128.0 / 255.0).abs() < 1e-4);

        let xs: Vec<f32> = bars.iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![0.0, 100.0, 200.0, 300.0]);
        let hues: Vec<f32> = bars.iter().map(|b| b.hue).collect();
        assert_eq!(hues, vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[test]
    fn draw_clears_then_fills() {
        let mut canvas = RecordingCanvas::new(400, 100);
        FrameRenderer::new(false).draw(&mut canvas, 4, &[255, 128, 0, 64], &[128; 4]);

        assert_eq!(canvas.ops.len(), 5);
        assert_eq!(canvas.ops[0], Op::Clear);
        assert_eq!(canvas.ops[1], Op::Fill(0.0, 0.0, 100.0, 100.0, [255, 0, 0, 255]));
        assert_eq!(canvas.ops[3], Op::Fill(200.0, 100.0, 100.0, 0.0, [0, 255, 255, 255]));
    }

    #[test]
    fn draw_is_repeatable() {
        let freqs = [10, 200, 33, 90, 255, 0, 1, 77];
        let times = [128; 8];
        let renderer = FrameRenderer::new(true);

        let mut a = RecordingCanvas::new(640, 360);
        let mut b = RecordingCanvas::new(640, 360);
        renderer.draw(&mut a, 8, &freqs, &times);
        renderer.draw(&mut b, 8, &freqs, &times);
        renderer.draw(&mut b, 8, &freqs, &times);

        assert_eq!(b.ops.len(), a.ops.len() * 2);
        assert_eq!(&b.ops[..a.ops.len()], &a.ops[..]);
        assert_eq!(&b.ops[a.ops.len()..], &a.ops[..]);
    }

    #[test]
    fn resize_between_draws_rescales_bars() {
        let renderer = FrameRenderer::new(false);
        let freqs = [255u8; 4];
        let mut canvas = RecordingCanvas::new(400, 100);
        renderer.draw(&mut canvas, 4, &freqs, &[128; 4]);
        canvas.width = 800;
        renderer.draw(&mut canvas, 4, &freqs, &[128; 4]);

        let widths: Vec<f32> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Fill(_, _, w, _, _) => Some(*w),
                _ => None,
            })
            .collect();
        assert_eq!(&widths[..4], &[100.0; 4]);
        assert_eq!(&widths[4..], &[200.0; 4]);
    }

    #[test]
    fn waveform_overlay_is_optional() {
        let mut plain = RecordingCanvas::new(100, 100);
        FrameRenderer::new(false).draw(&mut plain, 4, &[0; 4], &[128; 4]);
        assert!(!plain.ops.contains(&Op::Line));

        let mut overlay = RecordingCanvas::new(100, 100);
        FrameRenderer::new(true).draw(&mut overlay, 4, &[0; 4], &[128; 4]);
        assert_eq!(overlay.ops.iter().filter(|op| **op == Op::Line).count(), 3);
    }

    #[test]
    fn waveform_spans_width() {
        let points = waveform_points(3, &[0, 128, 255], 200.0, 100.0);
        assert_eq!(points[0], (0.0, 100.0));
        assert_eq!(points[2], (200.0, 0.0));
        assert!((points[1].1 - (100.0 - 128.0 / 255.0 * 100.0)).abs() < 1e-4);
    }

    #[test]
    fn empty_snapshot_draws_nothing() {
        assert!(bar_layout(0, &[], 100.0, 100.0).is_empty());
        assert!(waveform_points(1, &[128], 100.0, 100.0).is_empty());
    }
}
