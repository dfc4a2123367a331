//! # Frame Statistics
//!
//! Rolling frame-time history for the performance overlay. The last [`FRAME_SAMPLES`] frame
//! durations are kept in a ring buffer; averages and FPS are derived from it on demand.
//!
//! ```rust
//! use thistle::performance::FrameStats;
//!
//! let mut stats = FrameStats::new();
//! stats.record_frame(1.0 / 60.0);
//! assert!((stats.fps() - 60.0).abs() < 0.5);
//! ```

use std::collections::VecDeque;

use crate::gfx::rendering::{RenderPath, RenderStats};

/// Number of frame times kept for averaging and plotting.
pub const FRAME_SAMPLES: usize = 100;

#[derive(Debug, Clone)]
pub struct FrameStats {
    /// Frame times in milliseconds, oldest first
    frame_times: VecDeque<f32>,
    last_render: RenderStats,
    total_frames: u64,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(FRAME_SAMPLES),
            last_render: RenderStats::default(),
            total_frames: 0,
        }
    }

    /// Records one frame that took `dt` seconds.
    pub fn record_frame(&mut self, dt: f32) {
        if self.frame_times.len() == FRAME_SAMPLES {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(dt * 1000.0);
        self.total_frames += 1;
    }

    pub fn set_render_stats(&mut self, stats: RenderStats) {
        self.last_render = stats;
    }

    pub fn last_render(&self) -> RenderStats {
        self.last_render
    }

    /// Mean of the recorded frame times in milliseconds, 0 before the first frame.
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
    }

    pub fn fps(&self) -> f32 {
        let average = self.average_frame_time_ms();
        if average > 0.0 {
            1000.0 / average
        } else {
            0.0
        }
    }

    /// Recorded frame times in milliseconds, oldest first.
    pub fn samples(&self) -> Vec<f32> {
        self.frame_times.iter().copied().collect()
    }

    pub fn sample_count(&self) -> usize {
        self.frame_times.len()
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Small translucent overlay in the top-right corner.
    pub fn render_ui(&self, ui: &imgui::Ui, open: &mut bool) {
        let display_size = ui.io().display_size;
        if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
            return;
        }

        ui.window("Performance")
            .opened(open)
            .position(
                [display_size[0] - 230.0, 30.0],
                imgui::Condition::FirstUseEver,
            )
            .bg_alpha(0.35)
            .flags(imgui::WindowFlags::NO_DECORATION | imgui::WindowFlags::ALWAYS_AUTO_RESIZE)
            .build(|| {
                ui.text(format!("FPS: {:.1}", self.fps()));
                ui.text(format!("Frame: {:.2} ms", self.average_frame_time_ms()));
                let samples = self.samples();
                ui.plot_lines("##frame_times", &samples)
                    .graph_size([200.0, 40.0])
                    .scale_min(0.0)
                    .build();
                ui.separator();
                let render = self.last_render;
                ui.text(format!("Path: {}", path_label(render.path)));
                ui.text(format!("Objects drawn: {}", render.objects_drawn));
                ui.text(format!("Highlights: {}", render.highlights_drawn));
            });
    }
}

fn path_label(path: RenderPath) -> &'static str {
    match path {
        RenderPath::Forward => "forward",
        RenderPath::Deferred => "deferred",
        RenderPath::Tessellated => "tessellated",
        RenderPath::Aborted => "aborted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_keeps_last_samples() {
        let mut stats = FrameStats::new();
        for i in 0..(FRAME_SAMPLES + 20) {
            stats.record_frame(i as f32 / 1000.0);
        }
        assert_eq!(stats.sample_count(), FRAME_SAMPLES);
        assert_eq!(stats.total_frames(), (FRAME_SAMPLES + 20) as u64);
        let samples = stats.samples();
        assert!((samples[0] - 20.0).abs() < 1e-3);
        assert!((samples[FRAME_SAMPLES - 1] - 119.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_stats() {
        let stats = FrameStats::new();
        assert_eq!(stats.average_frame_time_ms(), 0.0);
        assert_eq!(stats.fps(), 0.0);
    }

    #[test]
    fn test_average_and_fps() {
        let mut stats = FrameStats::new();
        stats.record_frame(0.010);
        stats.record_frame(0.030);
        assert!((stats.average_frame_time_ms() - 20.0).abs() < 1e-3);
        assert!((stats.fps() - 50.0).abs() < 1e-2);
    }
}
