pub mod applied;
pub mod capture;
pub mod context;
pub mod depletion;
pub mod driver;
pub mod error;
pub mod model;
pub mod palette;
pub mod persist;
pub mod quantize;
pub mod queue;
pub mod raster;
pub mod runner;
pub mod signals;
pub mod sim;
pub mod state;
pub mod status;
pub mod supervisor;
pub mod surface;

pub use context::RunContext;
pub use driver::{drive, Clock, ManualClock, SystemClock, FRAME};
pub use error::RunError;
pub use model::{ActionItem, OrderMode, PaletteEntry, Placement, Rgb, Rgba, SurfaceBounds, SurfacePoint};
pub use persist::{FileSessionStore, MemorySessionStore, SessionSnapshot, SessionStore};
pub use raster::RgbaBuffer;
pub use runner::{Runner, StartOutcome};
pub use signals::{SignalFeed, SignalHandler, SignalKind, SignalSender};
pub use sim::SimulatedSurface;
pub use state::{Holds, RunLifecycle};
pub use surface::{DrawingSurface, PaletteControls};
