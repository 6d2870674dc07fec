//! Frame timing

/// Frame clock advanced by the renderer once per presented frame
///
/// The frame loop is driven externally, so the clock accumulates the delta
/// the caller hands to `Renderer::render` instead of sampling wall time.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl FrameClock {
    /// Create a clock at frame zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one frame that took `delta_time` seconds
    pub fn advance(&mut self, delta_time: f32) {
        let delta_time = delta_time.max(0.0);
        self.delta_time = delta_time;
        self.total_time += delta_time;
        self.frame_count += 1;
    }

    /// Duration of the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Seconds accumulated since the clock was created
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Number of frames presented so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Average FPS since creation
    pub fn average_fps(&self) -> f32 {
        if self.total_time > 0.0 {
            self.frame_count as f32 / self.total_time
        } else {
            0.0
        }
    }

    /// FPS based on the last frame only
    pub fn current_fps(&self) -> f32 {
        if self.delta_time > 0.0 {
            1.0 / self.delta_time
        } else {
            0.0
        }
    }
}
