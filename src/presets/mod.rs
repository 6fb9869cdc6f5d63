//! Pre-built patches for common sounds.
//!
//! Each preset is a ready-to-bind stage tree. Use them as-is, as starting
//! points for your own patches, or study them to see how different
//! timbres are put together from the six stage kinds.
//!
//! # Example
//!
//! ```ignore
//! use soundstage::presets;
//!
//! // Drums (bind at any frequency; the pitched ones care, noise ones don't)
//! let kick = presets::kick();
//! let snare = presets::snare();
//! let hihat = presets::hihat();
//!
//! // Melodic
//! let bass = presets::bass();
//! let pad = presets::pad();
//! let pluck = presets::pluck();
//! ```

mod bass;
mod hihat;
mod kick;
mod pad;
mod pluck;
mod snare;

pub use bass::bass;
pub use hihat::hihat;
pub use kick::kick;
pub use pad::pad;
pub use pluck::pluck;
pub use snare::snare;

use crate::stage::Stage;

/// Look a preset up by name, for players and CLIs.
pub fn by_name(name: &str) -> Option<Stage> {
    match name {
        "bass" => Some(bass()),
        "hihat" => Some(hihat()),
        "kick" => Some(kick()),
        "pad" => Some(pad()),
        "pluck" => Some(pluck()),
        "snare" => Some(snare()),
        _ => None,
    }
}
