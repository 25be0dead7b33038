// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Every way a render can fail.  All of them are fatal: a render
//! either fills every pixel or returns one of these, never a partial
//! buffer.

/// The failure taxonomy for a render.  Configuration problems are
/// caught before a single byte of the pixel buffer is allocated.
#[derive(Debug, Fail, PartialEq)]
pub enum RenderError {
    /// Width or height was zero.
    #[fail(display = "Image dimensions must be positive, got {}x{}", width, height)]
    InvalidDimensions {
        /// Requested image width
        width: usize,
        /// Requested image height
        height: usize,
    },

    /// The iteration bound was zero.
    #[fail(display = "Iteration count must be at least 1")]
    ZeroIterations,

    /// Zoom was zero, negative, or not a number.
    #[fail(display = "Zoom level must be a positive number, got {}", _0)]
    InvalidZoom(f64),

    /// The center point had a NaN or infinite component.
    #[fail(display = "Center point must be finite, got {},{}", _0, _1)]
    InvalidCenter(f64, f64),

    /// The viewport collapsed to zero width or height, or its corners
    /// are in the wrong order.
    #[fail(display = "Viewport corners {} and {} do not span a region", _0, _1)]
    DegenerateViewport(String, String),

    /// No worker threads were requested.
    #[fail(display = "Thread count must be at least 1")]
    ZeroThreads,

    /// Granularity was zero.
    #[fail(display = "Granularity must be at least 1")]
    ZeroGranularity,

    /// granularity * threads exceeds the number of pixels, which would
    /// make the chunk size zero.
    #[fail(
        display = "Granularity {} times {} threads exceeds the {} pixels in the image",
        granularity, threads, pixels
    )]
    TooManyChunks {
        /// Requested granularity
        granularity: usize,
        /// Requested thread count
        threads: usize,
        /// Total pixels in the image
        pixels: usize,
    },

    /// A chunk layout was asked for chunks with no pixels in them.
    #[fail(display = "Chunk size must be at least 1 pixel")]
    ZeroChunkSize,

    /// The pixel buffer could not be sized or allocated.
    #[fail(display = "Could not allocate a pixel buffer of {} bytes", _0)]
    Allocation(usize),

    /// A worker claimed a chunk index the layout does not have.
    #[fail(display = "Chunk {} is outside the image", _0)]
    ChunkOutOfRange(usize),

    /// A worker was handed a chunk whose slice had already been taken.
    #[fail(display = "Chunk {} was claimed twice", _0)]
    ChunkClaimedTwice(usize),

    /// A worker thread panicked; the render is abandoned.
    #[fail(display = "A render worker panicked")]
    WorkerPanicked,

    /// A palette file was unreadable or malformed.
    #[fail(display = "Palette error: {}", _0)]
    Palette(String),
}
