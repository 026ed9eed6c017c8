use std::collections::VecDeque;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{FieldConfig, DEFAULT_PALETTE};
use crate::draw::{DrawSurface, TriangleInstance};
use crate::timers::TimerQueue;

/// Flicker triangles are always white
pub const FLICKER_COLOR: [u8; 3] = [255, 255, 255];

/// Drawing surface in pixels: viewport width by twice the viewport height,
/// so the host can slide it up by one screen per section.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub fn for_viewport(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            width: viewport_width.max(0.0),
            height: viewport_height.max(0.0) * 2.0,
        }
    }

    pub fn min_dimension(&self) -> f32 {
        self.width.min(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// One past position of a trailing triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailSample {
    pub position: Vec2,
    pub angle: f32,
}

/// A single animated triangle
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub size: f32,
    pub center: Vec2,
    pub angle: f32,
    pub rotation_speed: f32,
    pub color: [u8; 3],
    pub velocity: Vec2,
    /// Delay between creation and first appearance
    pub spawn_delay_ms: f64,
    /// Absolute time at which the triangle starts moving and drawing
    pub spawn_at_ms: f64,
    pub opacity: f32,
    /// Set for flicker triangles once they are inserted
    pub flicker_start_ms: Option<f64>,
    /// Newest sample first; `None` for triangles without a trail
    pub trail: Option<VecDeque<TrailSample>>,
}

impl Triangle {
    /// A drifting triangle that is visible immediately. Useful for seeding a field by hand.
    pub fn drifting(center: Vec2, size: f32, velocity: Vec2, color: [u8; 3]) -> Self {
        Self {
            size,
            center,
            angle: 0.0,
            rotation_speed: 0.0,
            color,
            velocity,
            spawn_delay_ms: 0.0,
            spawn_at_ms: 0.0,
            opacity: 1.0,
            flicker_start_ms: None,
            trail: None,
        }
    }

    pub fn with_trail(mut self) -> Self {
        self.trail = Some(VecDeque::new());
        self
    }

    pub fn is_flickering(&self) -> bool {
        self.flicker_start_ms.is_some()
    }

    pub fn has_trail(&self) -> bool {
        self.trail.is_some()
    }

    pub fn trail_len(&self) -> usize {
        self.trail.as_ref().map_or(0, VecDeque::len)
    }

    pub fn is_spawned(&self, now_ms: f64) -> bool {
        self.is_flickering() || now_ms >= self.spawn_at_ms
    }

    /// Flicker triangles expire once their age reaches the flicker duration
    pub fn is_expired(&self, now_ms: f64, flicker_duration_ms: f64) -> bool {
        match self.flicker_start_ms {
            Some(start) => now_ms - start >= flicker_duration_ms,
            None => false,
        }
    }

    /// Advance rotation and position by one frame, wrap around the surface, record the trail
    pub fn step(&mut self, surface: SurfaceSize, trail_length: usize) {
        self.angle += self.rotation_speed;
        self.center += self.velocity;
        self.wrap(surface);

        if let Some(trail) = &mut self.trail {
            trail.push_front(TrailSample {
                position: self.center,
                angle: self.angle,
            });
            trail.truncate(trail_length);
        }
    }

    /// Toroidal wrap with the triangle's own size as margin
    pub fn wrap(&mut self, surface: SurfaceSize) {
        let margin = self.size;
        if self.center.x < -margin {
            self.center.x = surface.width + margin;
        }
        if self.center.x > surface.width + margin {
            self.center.x = -margin;
        }
        if self.center.y < -margin {
            self.center.y = surface.height + margin;
        }
        if self.center.y > surface.height + margin {
            self.center.y = -margin;
        }
    }

    fn instance(&self) -> TriangleInstance {
        TriangleInstance::new(self.center, self.size, self.angle, self.color, self.opacity)
    }
}

/// Owns the triangle pool and advances it once per display frame
pub struct TriangleField<R: Rng = StdRng> {
    config: FieldConfig,
    rng: R,
    triangles: Vec<Triangle>,
    bursts: TimerQueue<Triangle>,
    last_burst_ms: Option<f64>,
    surface: SurfaceSize,
    running: bool,
}

impl TriangleField<StdRng> {
    /// Field seeded from `config.seed`, or from OS entropy when unset
    pub fn from_config(config: FieldConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, rng)
    }
}

impl<R: Rng> TriangleField<R> {
    pub fn new(mut config: FieldConfig, rng: R) -> Self {
        if config.palette.is_empty() {
            log::warn!("Empty palette, using the default greys");
            config.palette = DEFAULT_PALETTE.to_vec();
        }
        let capacity = config.capacity;
        Self {
            config,
            rng,
            triangles: Vec::with_capacity(capacity),
            bursts: TimerQueue::new(),
            last_burst_ms: None,
            surface: SurfaceSize::default(),
            running: false,
        }
    }

    /// Mount the field: size the surface, reset the pool and timers, start the loop.
    /// The first frame after this spawns a line burst.
    pub fn initialize(&mut self, viewport_width: f32, viewport_height: f32) {
        self.surface = SurfaceSize::for_viewport(viewport_width, viewport_height);
        self.triangles.clear();
        self.bursts.clear();
        self.last_burst_ms = None;
        self.running = true;
        log::info!(
            "Triangle field initialized at {}x{}",
            self.surface.width,
            self.surface.height
        );
    }

    /// Re-apply sizing; the pool and timers are left alone
    pub fn on_resize(&mut self, viewport_width: f32, viewport_height: f32) {
        self.surface = SurfaceSize::for_viewport(viewport_width, viewport_height);
        log::debug!("Surface resized to {}x{}", self.surface.width, self.surface.height);
    }

    /// Stop the loop and drop pending burst insertions
    pub fn teardown(&mut self) {
        if self.running {
            log::info!("Triangle field torn down with {} triangles", self.triangles.len());
        }
        self.running = false;
        self.bursts.clear();
    }

    /// Run one frame at `now_ms` and paint it onto `surface`.
    /// Returns whether the host should schedule another frame.
    pub fn advance_frame(&mut self, now_ms: f64, surface: &mut dyn DrawSurface) -> bool {
        if !self.running {
            return false;
        }
        if self.surface.is_empty() {
            // Nothing to draw on yet
            return true;
        }

        self.insert_due_flickers(now_ms);

        let due_for_burst = self
            .last_burst_ms
            .map_or(true, |last| now_ms - last > self.config.burst_interval_ms);
        if due_for_burst {
            self.spawn_line_burst(now_ms);
            self.last_burst_ms = Some(now_ms);
        }

        let flicker_duration = self.config.flicker_duration_ms;
        self.triangles
            .retain(|triangle| !triangle.is_expired(now_ms, flicker_duration));

        self.update(now_ms);

        surface.clear();
        for triangle in &self.triangles {
            if triangle.is_spawned(now_ms) {
                self.draw_triangle(surface, triangle);
            }
        }

        self.top_up(now_ms);
        true
    }

    /// Schedule one line of flicker triangles at a random x, each inserted after its own random delay
    pub fn spawn_line_burst(&mut self, now_ms: f64) {
        let SurfaceSize { width, height } = self.surface;
        let x = self.rng.gen::<f32>() * width;
        let count = self.config.burst_count;

        for i in 0..count {
            let y = (height / count as f32) * i as f32;
            let flicker = self.create_flicker(Vec2::new(x, y));
            let delay = self.rng.gen::<f64>() * self.config.burst_stagger_ms;
            self.bursts.schedule(now_ms + delay, flicker);
        }
        log::debug!("Line burst at x={:.1} with {} flickers", x, count);
    }

    /// Random drifting triangle created at `now_ms`
    pub fn create_ordinary(&mut self, now_ms: f64) -> Triangle {
        let SurfaceSize { width, height } = self.surface;
        let min_dim = self.surface.min_dimension();
        let config = &self.config;
        let rng = &mut self.rng;

        let size = rng.gen::<f32>() * min_dim * config.size_scale + config.size_floor;
        let center = Vec2::new(rng.gen::<f32>() * width, rng.gen::<f32>() * height);
        let color = config.palette[rng.gen_range(0..config.palette.len())];

        let size_factor = if min_dim > 0.0 { size / min_dim } else { 0.0 };
        let speed_factor = if size_factor > 0.5 {
            config.large_speed_multiplier
        } else {
            config.small_speed_multiplier
        };
        let rotation_speed = (rng.gen::<f32>() - 0.5) * config.rotation_speed_scale * speed_factor;
        let velocity = Vec2::new(
            (rng.gen::<f32>() - 0.5) * 3.0 * config.max_speed * speed_factor,
            (rng.gen::<f32>() - 0.5) * 3.0 * config.max_speed * speed_factor,
        );
        let spawn_delay_ms = rng.gen::<f64>() * config.spawn_delay_ms;
        let has_trail = rng.gen::<f64>() < config.trail_chance;
        let angle = rng.gen::<f32>() * TAU;

        Triangle {
            size,
            center,
            angle,
            rotation_speed,
            color,
            velocity,
            spawn_delay_ms,
            spawn_at_ms: now_ms + spawn_delay_ms,
            opacity: 1.0,
            flicker_start_ms: None,
            trail: has_trail.then(VecDeque::new),
        }
    }

    fn create_flicker(&mut self, center: Vec2) -> Triangle {
        let angle = self.rng.gen::<f32>() * TAU;
        let opacity = self.rng.gen::<f32>();

        Triangle {
            size: self.config.flicker_size,
            center,
            angle,
            rotation_speed: 0.0,
            color: FLICKER_COLOR,
            velocity: Vec2::ZERO,
            spawn_delay_ms: 0.0,
            spawn_at_ms: 0.0,
            opacity,
            // Stamped when the burst timer fires
            flicker_start_ms: None,
            trail: None,
        }
    }

    fn insert_due_flickers(&mut self, now_ms: f64) {
        for timer in self.bursts.drain_due(now_ms) {
            let mut flicker = timer.payload;
            flicker.flicker_start_ms = Some(timer.due_ms);
            flicker.spawn_at_ms = timer.due_ms;
            self.triangles.push(flicker);
        }
    }

    fn update(&mut self, now_ms: f64) {
        let surface = self.surface;
        let trail_length = self.config.trail_length;
        let opacity_scale = self.config.flicker_opacity_scale;

        for triangle in &mut self.triangles {
            if let Some(start) = triangle.flicker_start_ms {
                triangle.opacity = ((now_ms - start) * opacity_scale).sin().abs() as f32;
            } else if triangle.is_spawned(now_ms) {
                triangle.step(surface, trail_length);
            }
        }
    }

    fn draw_triangle(&self, surface: &mut dyn DrawSurface, triangle: &Triangle) {
        if let Some(trail) = &triangle.trail {
            let fade_span = self.config.trail_length as f32 * self.config.trail_delay;
            for (index, sample) in trail.iter().enumerate() {
                let opacity = ((1.0 - index as f32 / fade_span) * 0.5).max(0.0);
                let offset = Vec2::new(sample.angle.cos(), sample.angle.sin())
                    * (self.config.trail_distance * index as f32);
                surface.fill_triangle(TriangleInstance::new(
                    sample.position - offset,
                    triangle.size,
                    sample.angle,
                    triangle.color,
                    opacity,
                ));
            }
        }
        surface.fill_triangle(triangle.instance());
    }

    fn top_up(&mut self, now_ms: f64) {
        let mut ordinary = self.ordinary_count();
        while ordinary < self.config.capacity {
            let triangle = self.create_ordinary(now_ms);
            self.triangles.push(triangle);
            ordinary += 1;
        }
    }

    /// Add a triangle to the pool as-is
    pub fn push(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn ordinary_count(&self) -> usize {
        self.triangles.iter().filter(|t| !t.is_flickering()).count()
    }

    pub fn flicker_count(&self) -> usize {
        self.triangles.iter().filter(|t| t.is_flickering()).count()
    }

    /// Scheduled insertion times of flickers that have not appeared yet
    pub fn pending_flicker_times(&self) -> Vec<f64> {
        self.bursts.pending().map(|timer| timer.due_ms).collect()
    }

    pub fn last_burst_ms(&self) -> Option<f64> {
        self.last_burst_ms
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::DrawList;

    fn field() -> TriangleField<StdRng> {
        let mut field = TriangleField::new(FieldConfig::default(), StdRng::seed_from_u64(42));
        field.initialize(800.0, 600.0);
        field
    }

    #[test]
    fn test_surface_is_double_viewport_height() {
        let field = field();
        assert_eq!(field.surface(), SurfaceSize { width: 800.0, height: 1200.0 });
    }

    #[test]
    fn test_resize_keeps_pool() {
        let mut field = field();
        let mut list = DrawList::new();
        field.advance_frame(0.0, &mut list);
        let before = field.triangles().to_vec();

        field.on_resize(1024.0, 768.0);
        assert_eq!(field.surface(), SurfaceSize { width: 1024.0, height: 1536.0 });
        assert_eq!(field.triangles(), before.as_slice());
        assert_eq!(field.last_burst_ms(), Some(0.0));
    }

    #[test]
    fn test_ordinary_triangle_ranges() {
        let mut field = field();
        let config = FieldConfig::default();
        for _ in 0..500 {
            let t = field.create_ordinary(100.0);
            assert!(t.size >= 50.0 && t.size <= 800.0 * 0.6 + 50.0);
            assert!(t.center.x >= 0.0 && t.center.x <= 800.0);
            assert!(t.center.y >= 0.0 && t.center.y <= 1200.0);
            assert!(config.palette.contains(&t.color));
            // Largest multiplier is 2: |v| < 0.5 * 3 * 0.5 * 2
            assert!(t.velocity.x.abs() <= 1.5 && t.velocity.y.abs() <= 1.5);
            assert!(t.spawn_delay_ms >= 0.0 && t.spawn_delay_ms <= 3000.0);
            assert_eq!(t.spawn_at_ms, 100.0 + t.spawn_delay_ms);
            assert!(!t.is_flickering());
            assert_eq!(t.opacity, 1.0);
        }
    }

    #[test]
    fn test_large_triangles_move_slower() {
        let mut field = field();
        for _ in 0..500 {
            let t = field.create_ordinary(0.0);
            let bound = if t.size / 800.0 > 0.5 { 0.375 } else { 1.5 };
            assert!(t.velocity.x.abs() <= bound);
            assert!(t.rotation_speed.abs() <= 0.005 * if bound < 1.0 { 0.5 } else { 2.0 });
        }
    }

    #[test]
    fn test_step_moves_by_velocity() {
        let surface = SurfaceSize::for_viewport(800.0, 600.0);
        let mut t = Triangle::drifting(Vec2::new(100.0, 100.0), 60.0, Vec2::new(1.0, -0.5), [96, 96, 96]);
        t.rotation_speed = 0.1;
        t.step(surface, 5);
        assert_eq!(t.center, Vec2::new(101.0, 99.5));
        assert!((t.angle - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_each_edge() {
        let surface = SurfaceSize { width: 800.0, height: 1200.0 };
        let mut t = Triangle::drifting(Vec2::new(-60.5, 10.0), 60.0, Vec2::ZERO, [96, 96, 96]);
        t.wrap(surface);
        assert_eq!(t.center.x, 860.0);

        t.center = Vec2::new(861.0, 10.0);
        t.wrap(surface);
        assert_eq!(t.center.x, -60.0);

        t.center = Vec2::new(10.0, -61.0);
        t.wrap(surface);
        assert_eq!(t.center.y, 1260.0);

        t.center = Vec2::new(10.0, 1261.0);
        t.wrap(surface);
        assert_eq!(t.center.y, -60.0);
    }

    #[test]
    fn test_wrap_margin_is_inclusive() {
        let surface = SurfaceSize { width: 800.0, height: 1200.0 };
        let mut t = Triangle::drifting(Vec2::new(-60.0, 860.0), 60.0, Vec2::ZERO, [96, 96, 96]);
        t.wrap(surface);
        assert_eq!(t.center, Vec2::new(-60.0, 860.0));
    }

    #[test]
    fn test_trail_is_newest_first_and_bounded() {
        let surface = SurfaceSize::for_viewport(800.0, 600.0);
        let mut t = Triangle::drifting(Vec2::new(0.0, 0.0), 60.0, Vec2::new(1.0, 0.0), [96, 96, 96])
            .with_trail();
        for _ in 0..8 {
            t.step(surface, 5);
        }
        let trail = t.trail.as_ref().unwrap();
        assert_eq!(trail.len(), 5);
        assert_eq!(trail[0].position, Vec2::new(8.0, 0.0));
        assert_eq!(trail[4].position, Vec2::new(4.0, 0.0));
    }

    #[test]
    fn test_flicker_expiry_boundary() {
        let mut t = Triangle::drifting(Vec2::ZERO, 50.0, Vec2::ZERO, FLICKER_COLOR);
        t.flicker_start_ms = Some(1000.0);
        assert!(!t.is_expired(2999.9, 2000.0));
        assert!(t.is_expired(3000.0, 2000.0));
        assert!(t.is_spawned(0.0));
    }

    #[test]
    fn test_unspawned_triangle_is_frozen_and_hidden() {
        let mut field = field();
        let mut list = DrawList::new();
        field.advance_frame(0.0, &mut list);

        let mut late = Triangle::drifting(Vec2::new(400.0, 400.0), 60.0, Vec2::new(1.0, 1.0), [193, 193, 193]);
        late.spawn_delay_ms = 500.0;
        late.spawn_at_ms = 500.0;
        field.push(late);
        let index = field.triangles().len() - 1;

        field.advance_frame(100.0, &mut list);
        assert_eq!(field.triangles()[index].center, Vec2::new(400.0, 400.0));
        assert!(!list.triangles.iter().any(|i| i.center == [400.0, 400.0] && i.color[0] == 193.0 / 255.0));

        field.advance_frame(500.0, &mut list);
        assert_eq!(field.triangles()[index].center, Vec2::new(401.0, 401.0));
        assert!(list.triangles.iter().any(|i| i.center == [401.0, 401.0]));
    }

    #[test]
    fn test_trail_ghosts_fade_and_offset() {
        let mut field = field();
        let mut list = DrawList::new();
        field.advance_frame(0.0, &mut list);

        let mut trailing = Triangle::drifting(Vec2::new(300.0, 300.0), 60.0, Vec2::new(2.0, 0.0), [147, 147, 147])
            .with_trail();
        trailing.angle = 0.0;
        field.push(trailing);

        // Drop everything else so the draw list only holds our triangle
        field.triangles.retain(|t| t.has_trail() && t.color == [147, 147, 147] && t.size == 60.0);
        field.config.capacity = 1;
        field.bursts.clear();
        field.last_burst_ms = Some(0.0);

        for frame in 1..=5 {
            field.advance_frame(frame as f64, &mut list);
        }

        // 5 ghosts then the body
        assert_eq!(list.len(), 6);
        let ghosts = &list.triangles[..5];
        for (index, ghost) in ghosts.iter().enumerate() {
            let expected = ((1.0 - index as f32 / 3.75) * 0.5).max(0.0);
            assert!((ghost.opacity() - expected).abs() < 1e-6);
        }
        assert_eq!(ghosts[4].opacity(), 0.0);
        // Newest sample sits on the body, older ones shifted back along the angle
        assert_eq!(ghosts[0].center, [310.0, 300.0]);
        assert_eq!(ghosts[1].center, [308.0 - 10.0, 300.0]);
        assert_eq!(list.triangles[5].center, [310.0, 300.0]);
        assert_eq!(list.triangles[5].opacity(), 1.0);
    }

    #[test]
    fn test_advance_is_noop_before_initialize_and_after_teardown() {
        let mut field = TriangleField::new(FieldConfig::default(), StdRng::seed_from_u64(1));
        let mut list = DrawList::new();
        assert!(!field.advance_frame(0.0, &mut list));
        assert!(field.triangles().is_empty());

        field.initialize(800.0, 600.0);
        assert!(field.advance_frame(0.0, &mut list));
        assert_eq!(field.pending_flicker_times().len(), 10);

        field.teardown();
        assert!(!field.is_running());
        assert!(field.pending_flicker_times().is_empty());
        assert!(!field.advance_frame(10.0, &mut list));
    }

    #[test]
    fn test_empty_palette_falls_back_to_default() {
        let config = FieldConfig {
            palette: Vec::new(),
            ..FieldConfig::default()
        };
        let mut field = TriangleField::new(config, StdRng::seed_from_u64(4));
        field.initialize(800.0, 600.0);
        let mut list = DrawList::new();
        field.advance_frame(0.0, &mut list);

        assert_eq!(field.config().palette, DEFAULT_PALETTE.to_vec());
        assert_eq!(field.ordinary_count(), 55);
        assert!(field
            .triangles()
            .iter()
            .all(|t| DEFAULT_PALETTE.contains(&t.color)));
    }

    #[test]
    fn test_zero_area_surface_draws_nothing() {
        let mut field = TriangleField::new(FieldConfig::default(), StdRng::seed_from_u64(3));
        field.initialize(0.0, 0.0);
        let mut list = DrawList::new();
        assert!(field.advance_frame(0.0, &mut list));
        assert!(list.is_empty());
        assert!(field.triangles().is_empty());
    }
}
