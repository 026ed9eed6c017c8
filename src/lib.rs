// Library exports for WebAssembly and library usage
pub mod clock;
pub mod config;
pub mod draw;
pub mod error;
pub mod particle_system;
pub mod renderer;
pub mod stage;
pub mod timers;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::FieldConfig;
pub use draw::{DrawList, DrawSurface, TriangleInstance};
pub use error::{TrifieldError, TrifieldResult};
pub use particle_system::{SurfaceSize, Triangle, TriangleField};
pub use renderer::Renderer;
pub use stage::{Stage, StageFrame};
