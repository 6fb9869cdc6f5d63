pub mod binding; // Pitch-bound playback trees
pub mod dsp; // Primitives shared by engine implementations
pub mod engine; // Audio-engine collaborator contract
pub mod error;
pub mod presets; // Ready-to-bind patches for common sounds
pub mod stage; // Stage trees and their press/release rules
pub mod unlock;

pub use binding::{Binding, BindingState};
pub use error::PatchError;
pub use stage::Stage;

pub const MAX_BLOCK_SIZE: usize = 2048;
