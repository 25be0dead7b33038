// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parameters of a single render.  Built once on the driving
//! thread, validated, and then shared read-only by every worker.

use num::Complex;
use num_cpus;
use std::path::PathBuf;

use errors::RenderError;

/// Default image width, in pixels.
pub const DEFAULT_WIDTH: usize = 3840;
/// Default image height, in pixels.
pub const DEFAULT_HEIGHT: usize = 2160;
/// Default zoom; 1.0 shows the plane from -2 to 2 along the real axis.
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Default iteration bound.
pub const DEFAULT_ITERATIONS: usize = 100;
/// Default chunks-per-thread multiplier.
pub const DEFAULT_GRANULARITY: usize = 1;
/// Default output file.
pub const DEFAULT_OUTPUT: &str = "mandelbrot.bmp";

/// How chunk indices are handed to workers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Schedule {
    /// Worker `t` takes chunks `t, t + threads, t + 2 * threads, ...`
    Static,
    /// Workers pull the next chunk from a shared atomic counter.
    Dynamic,
}

/// Which escape-time kernel the workers run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Kernel {
    /// One point at a time.
    Scalar,
    /// Fixed-size structure-of-arrays batches.
    Batched,
}

/// What a single pixel of the output buffer holds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OutputMode {
    /// Three bytes per pixel, `[r, g, b]`.
    Rgb,
    /// One byte per pixel, an index into a 256-entry palette.
    Palette,
}

impl OutputMode {
    /// Bytes occupied by a single pixel; this is the unit the
    /// partitioner strides over.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            OutputMode::Rgb => 3,
            OutputMode::Palette => 1,
        }
    }
}

/// Everything a render needs to know.  Immutable once handed to
/// `render`.
#[derive(Clone, Debug)]
pub struct RenderParameters {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Magnification; the viewport half-width is `2 / zoom`.
    pub zoom: f64,
    /// The point of the complex plane at the center of the image
    pub center: Complex<f64>,
    /// Upper bound on recurrence iterations per point
    pub iterations: usize,
    /// Number of worker threads
    pub threads: usize,
    /// Chunks created per worker thread
    pub granularity: usize,
    /// Chunk hand-out policy
    pub schedule: Schedule,
    /// Kernel used by the workers
    pub kernel: Kernel,
    /// Pixel layout of the output buffer
    pub mode: OutputMode,
    /// Where the serializer writes the finished image
    pub output: PathBuf,
}

impl Default for RenderParameters {
    fn default() -> Self {
        RenderParameters {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            zoom: DEFAULT_ZOOM,
            center: Complex::new(0.0, 0.0),
            iterations: DEFAULT_ITERATIONS,
            threads: num_cpus::get(),
            granularity: DEFAULT_GRANULARITY,
            schedule: Schedule::Static,
            kernel: Kernel::Batched,
            mode: OutputMode::Rgb,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl RenderParameters {
    /// Defaults for everything except the image size.
    pub fn new(width: usize, height: usize) -> Self {
        RenderParameters {
            width,
            height,
            ..RenderParameters::default()
        }
    }

    /// Set the zoom level.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    /// Set the center of the rendered region.
    pub fn with_center(mut self, center: Complex<f64>) -> Self {
        self.center = center;
        self
    }

    /// Set the iteration bound.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the chunks-per-thread multiplier.
    pub fn with_granularity(mut self, granularity: usize) -> Self {
        self.granularity = granularity;
        self
    }

    /// Set the scheduling policy.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Set the kernel.
    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the output pixel layout.
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the output path.
    pub fn with_output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = output.into();
        self
    }

    /// Total pixels in the image.  Saturates rather than overflowing;
    /// `validate` rejects sizes whose buffer cannot be addressed.
    pub fn pixels(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Size of the output buffer in bytes, if it fits in memory at all.
    pub fn buffer_len(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)
            .and_then(|p| p.checked_mul(self.mode.bytes_per_pixel()))
    }

    /// Check every configuration constraint.  Runs before any buffer
    /// allocation or thread spawn.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.iterations == 0 {
            return Err(RenderError::ZeroIterations);
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(RenderError::InvalidZoom(self.zoom));
        }
        if !(self.center.re.is_finite() && self.center.im.is_finite()) {
            return Err(RenderError::InvalidCenter(self.center.re, self.center.im));
        }
        if self.threads == 0 {
            return Err(RenderError::ZeroThreads);
        }
        if self.granularity == 0 {
            return Err(RenderError::ZeroGranularity);
        }
        let len = match self.buffer_len() {
            Some(len) => len,
            None => return Err(RenderError::Allocation(usize::max_value())),
        };
        if len > isize::max_value() as usize {
            return Err(RenderError::Allocation(len));
        }
        let pixels = self.pixels();
        match self.granularity.checked_mul(self.threads) {
            Some(chunks) if chunks <= pixels => Ok(()),
            _ => Err(RenderError::TooManyChunks {
                granularity: self.granularity,
                threads: self.threads,
                pixels,
            }),
        }
    }
}
