//! textmend — diff, fuzzy match, and drift-tolerant patching for text.
//!
//! The engine computes human-pleasing edit scripts between two strings,
//! locates fuzzy occurrences of a pattern near an expected position, and
//! builds patches that still apply after the target text has drifted.
//! All offsets and lengths are in UTF-16 code units so the wire formats
//! (tab-separated deltas, `@@`-hunk patch text) stay stable across host
//! string encodings.
//!
//! # Example
//!
//! ```
//! use textmend::{Engine, PatchSource};
//!
//! let engine = Engine::new();
//! let patches = engine.patch_make(PatchSource::Texts(
//!     "The quick brown fox jumps over the lazy dog.",
//!     "That quick brown fox jumped over a lazy dog.",
//! ));
//! let (patched, applied) = engine.patch_apply(
//!     &patches,
//!     "The quick red rabbit jumps over the tired tiger.",
//! );
//! assert_eq!(patched, "That quick red rabbit jumped over a tired tiger.");
//! assert!(applied.iter().all(|&ok| ok));
//! ```

pub mod bitap;
pub mod cleanup;
pub mod delta;
pub mod diff;
pub mod patch;
pub mod unit;

pub use bitap::MatchError;
pub use delta::DeltaError;
pub use diff::{Diff, Op};
pub use patch::{patch_from_text, patch_to_text, Patch, PatchParseError, PatchSource};

/// Tuning knobs shared by the diff, match, and patch layers.
///
/// One engine serves one logical thread; fields are plain data and may
/// be reassigned between calls to steer behavior.
#[derive(Debug, Clone)]
pub struct Engine {
    /// Seconds to spend producing a diff before falling back to a
    /// coarser result. `0.0` removes the limit (and disables the
    /// half-match shortcut, so the diff is optimal).
    pub diff_timeout: f32,
    /// Cost of an empty edit operation in terms of edit characters,
    /// consumed by the efficiency cleanup.
    pub diff_edit_cost: usize,
    /// Ceiling on the weighted error score a fuzzy match may carry
    /// (0.0 exact only, 1.0 matches anything).
    pub match_threshold: f32,
    /// Distance over which the location penalty of a fuzzy match ramps
    /// up to 1.0. `0` accepts matches at the expected location only.
    pub match_distance: usize,
    /// Width of the bit registers used by the fuzzy search, and thus
    /// the longest locatable pattern.
    pub match_max_bits: usize,
    /// Code units of context carried around each patch hunk.
    pub patch_margin: usize,
    /// When deleting a large block, how far the actual content may
    /// stray from the expected content before the patch is refused.
    pub patch_delete_threshold: f32,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            diff_timeout: 1.0,
            diff_edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            match_max_bits: 32,
            patch_margin: 4,
            patch_delete_threshold: 0.5,
        }
    }
}

impl Engine {
    /// Creates an engine with the default tuning.
    pub fn new() -> Self {
        Self::default()
    }
}
