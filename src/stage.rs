// Host side of the surface contract: which screen-high slice of the double
// height surface is visible, and how opaque it is, per page section.

use winit::dpi::{LogicalSize, PhysicalSize};

/// Landing section and the dark section below it
pub const SECTION_COUNT: usize = 2;
/// Duration of offset, opacity and background transitions
pub const TRANSITION_MS: f64 = 1000.0;

const LIGHT_BACKGROUND: [f32; 3] = [0.93, 0.93, 0.93];
const DARK_BACKGROUND: [f32; 3] = [0.0, 0.0, 0.0];
const DARK_SCALE: f32 = 0.95;

/// Viewport in logical (CSS) pixels, the unit every field constant is expressed in
pub fn logical_viewport(physical: PhysicalSize<u32>, scale_factor: f64) -> (f32, f32) {
    let logical: LogicalSize<f32> = physical.to_logical(scale_factor);
    (logical.width, logical.height)
}

/// Per-frame values handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageFrame {
    /// Vertical translation of the surface in logical pixels
    pub offset_y: f32,
    pub opacity: f32,
    pub scale: f32,
    pub background: [f32; 3],
}

/// Eased move from one value to another
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: f32,
    to: f32,
    start_ms: f64,
}

impl Transition {
    fn settled(value: f32) -> Self {
        Self {
            from: value,
            to: value,
            start_ms: f64::NEG_INFINITY,
        }
    }

    fn value(&self, now_ms: f64) -> f32 {
        let progress = ((now_ms - self.start_ms) / TRANSITION_MS).clamp(0.0, 1.0) as f32;
        let eased = progress * progress * (3.0 - 2.0 * progress);
        self.from + (self.to - self.from) * eased
    }

    fn retarget(&mut self, to: f32, now_ms: f64) {
        self.from = self.value(now_ms);
        self.to = to;
        self.start_ms = now_ms;
    }
}

#[derive(Debug)]
pub struct Stage {
    section: usize,
    /// Offset in viewport heights, so resizing needs no retargeting
    offset: Transition,
    opacity: Transition,
    scale: Transition,
    darkness: Transition,
}

impl Stage {
    pub fn new() -> Self {
        Self {
            section: 0,
            offset: Transition::settled(0.0),
            opacity: Transition::settled(1.0),
            scale: Transition::settled(1.0),
            darkness: Transition::settled(0.0),
        }
    }

    pub fn section(&self) -> usize {
        self.section
    }

    /// The second section hides the field behind a black page
    pub fn is_dark(&self) -> bool {
        self.section == 1
    }

    /// Jump to a section; out of range indices are clamped
    pub fn set_section(&mut self, section: usize, now_ms: f64) {
        let section = section.min(SECTION_COUNT - 1);
        if section == self.section {
            return;
        }
        self.section = section;
        let dark = self.is_dark();

        self.offset.retarget(-(section as f32), now_ms);
        self.opacity.retarget(if dark { 0.0 } else { 1.0 }, now_ms);
        self.scale.retarget(if dark { DARK_SCALE } else { 1.0 }, now_ms);
        self.darkness.retarget(if dark { 1.0 } else { 0.0 }, now_ms);
        log::info!("Section {} active", section);
    }

    pub fn next_section(&mut self, now_ms: f64) {
        self.set_section(self.section + 1, now_ms);
    }

    pub fn previous_section(&mut self, now_ms: f64) {
        self.set_section(self.section.saturating_sub(1), now_ms);
    }

    pub fn frame(&self, now_ms: f64, viewport_height: f32) -> StageFrame {
        let darkness = self.darkness.value(now_ms);
        let mut background = [0.0; 3];
        for (channel, out) in background.iter_mut().enumerate() {
            *out = LIGHT_BACKGROUND[channel]
                + (DARK_BACKGROUND[channel] - LIGHT_BACKGROUND[channel]) * darkness;
        }

        StageFrame {
            offset_y: self.offset.value(now_ms) * viewport_height,
            opacity: self.opacity.value(now_ms),
            scale: self.scale.value(now_ms),
            background,
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_section_shows_top_half() {
        let stage = Stage::new();
        let frame = stage.frame(0.0, 600.0);
        assert_eq!(frame.offset_y, 0.0);
        assert_eq!(frame.opacity, 1.0);
        assert_eq!(frame.scale, 1.0);
        assert_eq!(frame.background, LIGHT_BACKGROUND);
    }

    #[test]
    fn test_second_section_slides_up_and_fades() {
        let mut stage = Stage::new();
        stage.next_section(1000.0);
        assert!(stage.is_dark());

        let halfway = stage.frame(1500.0, 600.0);
        assert!(halfway.offset_y < 0.0 && halfway.offset_y > -600.0);
        assert!(halfway.opacity > 0.0 && halfway.opacity < 1.0);

        let done = stage.frame(2000.0, 600.0);
        assert_eq!(done.offset_y, -600.0);
        assert_eq!(done.opacity, 0.0);
        assert_eq!(done.scale, DARK_SCALE);
        assert_eq!(done.background, DARK_BACKGROUND);
    }

    #[test]
    fn test_offset_follows_viewport_height() {
        let mut stage = Stage::new();
        stage.set_section(1, 0.0);
        assert_eq!(stage.frame(5000.0, 900.0).offset_y, -900.0);
    }

    #[test]
    fn test_logical_viewport_divides_out_scale_factor() {
        assert_eq!(logical_viewport(PhysicalSize::new(1280, 720), 1.0), (1280.0, 720.0));
        assert_eq!(logical_viewport(PhysicalSize::new(2560, 1440), 2.0), (1280.0, 720.0));
        assert_eq!(logical_viewport(PhysicalSize::new(1920, 1080), 1.5), (1280.0, 720.0));
    }

    #[test]
    fn test_section_clamps() {
        let mut stage = Stage::new();
        stage.previous_section(0.0);
        assert_eq!(stage.section(), 0);
        stage.set_section(7, 0.0);
        assert_eq!(stage.section(), SECTION_COUNT - 1);
        stage.next_section(10.0);
        assert_eq!(stage.section(), SECTION_COUNT - 1);
    }

    #[test]
    fn test_reversing_mid_transition_starts_from_current_value() {
        let mut stage = Stage::new();
        stage.next_section(0.0);
        let mid = stage.frame(500.0, 100.0).opacity;
        stage.previous_section(500.0);
        assert_eq!(stage.frame(500.0, 100.0).opacity, mid);
        assert_eq!(stage.frame(1500.0, 100.0).opacity, 1.0);
    }
}
