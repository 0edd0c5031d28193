// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong before or during a render.  Nothing
//! here is retried: the computations are pure, so the same input will
//! fail the same way twice.

use failure::Fail;

/// The failure taxonomy of the renderer.
#[derive(Debug, Fail, PartialEq)]
pub enum FractalError {
    /// A numeric or textual parameter was rejected before any work
    /// started.
    #[fail(display = "invalid configuration: {}", _0)]
    Config(String),

    /// The mask image backing a raster orbit trap could not be read or
    /// decoded.
    #[fail(display = "could not load orbit mask {}: {}", path, reason)]
    Mask {
        /// Where we looked for the mask.
        path: String,
        /// What the decoder told us.
        reason: String,
    },

    /// One of the band workers panicked; the image is discarded.
    #[fail(display = "a render worker panicked")]
    Worker,

    /// The pixel buffer did not match the requested dimensions.
    #[fail(display = "pixel buffer does not match a {}x{} image", _0, _1)]
    Buffer(usize, usize),
}

impl FractalError {
    /// Shorthand for configuration errors.
    pub fn config<S: Into<String>>(message: S) -> Self {
        FractalError::Config(message.into())
    }
}
