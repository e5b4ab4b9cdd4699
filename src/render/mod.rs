pub mod canvas;
pub mod frame;

use std::cell::RefCell;
use std::rc::Rc;

use crate::playback::Visualizer;
use canvas::PixelCanvas;
use frame::FrameRenderer;

/// Paints snapshots onto a canvas the host also holds, so the host can
/// resize it or read frames back between draws.
pub struct CanvasVisualizer {
    renderer: FrameRenderer,
    canvas: Rc<RefCell<PixelCanvas>>,
}

impl CanvasVisualizer {
    pub fn new(renderer: FrameRenderer, canvas: Rc<RefCell<PixelCanvas>>) -> Self {
        Self { renderer, canvas }
    }
}

impl Visualizer for CanvasVisualizer {
    fn draw(&mut self, bin_count: usize, frequencies: &[u8], times: &[u8]) {
        let mut canvas = self.canvas.borrow_mut();
        self.renderer
            .draw(&mut *canvas, bin_count, frequencies, times);
    }
}
