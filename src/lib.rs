#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which the recurrence `z = z * z + c` stays bounded.  For every
//! pixel of an image we find its point on the plane, iterate that
//! point until it either escapes (its modulus exceeds 2) or runs out
//! of iterations, and turn the number of iterations it took into a
//! color.  Points that never escape are inside the set, and get the
//! darkest color on offer.
//!
//! The image is cut into chunks of pixels, and the chunks are handed
//! out to worker threads, either striped round-robin or claimed from a
//! shared counter as each worker finishes its last chunk.  Each worker
//! writes only into the chunks it claimed, so the resulting image is
//! the same no matter how many threads there were, or which of them
//! did what.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate tracing;
extern crate crossbeam;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;

#[cfg(test)]
extern crate rand;
#[cfg(test)]
extern crate tempfile;

pub mod bmp;
pub mod colors;
pub mod errors;
pub mod escape;
pub mod params;
pub mod partition;
pub mod planes;
pub mod render;

pub use colors::Palette;
pub use errors::RenderError;
pub use params::{Kernel, OutputMode, RenderParameters, Schedule};
pub use render::{render, MandelbrotRenderer, PixelBuffer};
