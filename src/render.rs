// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render driver.
//!
//! A render validates its parameters, derives the viewport and the
//! chunk layout, allocates a zeroed pixel buffer, and then spawns one
//! scoped worker thread per requested thread.  Each worker claims
//! chunk indices from the scheduler, takes the matching slice of the
//! buffer, maps every pixel in it to the complex plane, runs the
//! escape-time kernel, and writes the resulting color.  Workers never
//! touch a slice they did not claim, so the buffer itself needs no
//! locking.  When every worker has been joined the buffer is handed
//! back to the caller, whole; there is no partial result.

use crossbeam;
use crossbeam::thread::ScopedJoinHandle;
use std::ops::Range;
use std::time::Instant;

use colors::{tint, to_color};
use errors::RenderError;
use escape::{escape_steps, escape_steps_batch, LANES};
use params::{Kernel, OutputMode, RenderParameters};
use partition::{ChunkLayout, ChunkSlots, Scheduler};
use planes::{Pixel, PlaneMapper};

/// A finished image: `height` rows of `width` pixels with no padding
/// between rows.  Row 0 is the bottom edge of the viewport.  In RGB mode each pixel
/// is three bytes; in palette mode it is a single palette index.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// What each pixel holds
    pub mode: OutputMode,
    /// The raw bytes, `width * height * mode.bytes_per_pixel()` of them
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Bytes in a single row.
    pub fn stride(&self) -> usize {
        self.width * self.mode.bytes_per_pixel()
    }

    /// The bytes of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let stride = self.stride();
        &self.pixels[y * stride..(y + 1) * stride]
    }

    /// The bytes of the pixel at `x`, `y`.
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let unit = self.mode.bytes_per_pixel();
        &self.row(y)[x * unit..(x + 1) * unit]
    }
}

/// The validated, precomputed state of a render.  Once built it is
/// only ever read, and is shared by reference with every worker.
#[derive(Debug)]
pub struct MandelbrotRenderer {
    params: RenderParameters,
    plane: PlaneMapper,
    layout: ChunkLayout,
}

impl MandelbrotRenderer {
    /// Validates the parameters and derives the viewport and the chunk
    /// layout.  Every configuration error surfaces here, before any
    /// allocation.
    pub fn new(params: RenderParameters) -> Result<Self, RenderError> {
        params.validate()?;
        let plane = PlaneMapper::from_params(&params)?;
        let layout = ChunkLayout::new(params.pixels(), params.granularity, params.threads)?;
        Ok(MandelbrotRenderer {
            params,
            plane,
            layout,
        })
    }

    /// The parameters this renderer was built from.
    pub fn params(&self) -> &RenderParameters {
        &self.params
    }

    /// The chunk layout workers will claim from.
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    fn allocate(&self) -> Result<Vec<u8>, RenderError> {
        let len = self
            .params
            .buffer_len()
            .ok_or_else(|| RenderError::Allocation(usize::max_value()))?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| RenderError::Allocation(len))?;
        pixels.resize(len, 0);
        Ok(pixels)
    }

    fn finish(&self, pixels: Vec<u8>) -> PixelBuffer {
        PixelBuffer {
            width: self.params.width,
            height: self.params.height,
            mode: self.params.mode,
            pixels,
        }
    }

    #[inline]
    fn paint(&self, pixel: &mut [u8], color: u8) {
        match self.params.mode {
            OutputMode::Rgb => pixel.copy_from_slice(&tint(color)),
            OutputMode::Palette => pixel[0] = color,
        }
    }

    /// Fill the pixels of `range` into `out`, one point at a time.
    fn fill_scalar(&self, range: Range<usize>, out: &mut [u8]) {
        let limit = self.params.iterations;
        let unit = self.params.mode.bytes_per_pixel();
        for (offset, pixel) in range.zip(out.chunks_mut(unit)) {
            let steps = escape_steps(self.plane.offset_to_point(offset), limit);
            self.paint(pixel, to_color(steps, limit));
        }
    }

    /// Fill the pixels of `range` into `out`, `LANES` points at a time.
    /// A short final batch repeats its last point in the unused lanes.
    fn fill_batched(&self, range: Range<usize>, out: &mut [u8]) {
        let limit = self.params.iterations;
        let unit = self.params.mode.bytes_per_pixel();
        let mut re = [0f64; LANES];
        let mut im = [0f64; LANES];
        for (batch, pixels) in out.chunks_mut(LANES * unit).enumerate() {
            let first = range.start + batch * LANES;
            let last = pixels.len() / unit - 1;
            for k in 0..LANES {
                let c = self.plane.offset_to_point(first + k.min(last));
                re[k] = c.re;
                im[k] = c.im;
            }
            let steps = escape_steps_batch(&re, &im, limit);
            for (pixel, s) in pixels.chunks_mut(unit).zip(steps.iter()) {
                self.paint(pixel, to_color(*s, limit));
            }
        }
    }

    // One worker's share of the render: returns the number of chunks
    // it completed.
    fn work(&self, worker: usize, scheduler: &Scheduler, slots: &ChunkSlots) -> Result<usize, RenderError> {
        let start = Instant::now();
        let mut completed = 0;
        for index in scheduler.claims(worker) {
            let range = match self.layout.chunk(index) {
                Some(range) => range,
                None => return Err(RenderError::ChunkOutOfRange(index)),
            };
            let out = match slots.take(index) {
                Some(out) => out,
                None => return Err(RenderError::ChunkClaimedTwice(index)),
            };
            match self.params.kernel {
                Kernel::Scalar => self.fill_scalar(range, out),
                Kernel::Batched => self.fill_batched(range, out),
            }
            completed += 1;
        }
        debug!(
            worker = worker,
            chunks = completed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "worker finished"
        );
        Ok(completed)
    }

    /// The multi-threaded render.  Spawns `threads` workers, waits for
    /// all of them, and returns the finished buffer.
    pub fn render(&self) -> Result<PixelBuffer, RenderError> {
        let params = &self.params;
        info!(
            width = params.width,
            height = params.height,
            iterations = params.iterations,
            zoom = params.zoom,
            threads = params.threads,
            granularity = params.granularity,
            schedule = ?params.schedule,
            kernel = ?params.kernel,
            mode = ?params.mode,
            "starting render"
        );
        debug!(
            chunk_size = self.layout.chunk_size,
            chunks = self.layout.chunks_count,
            remainder = self.layout.remainder,
            "chunk layout"
        );

        let mut pixels = self.allocate()?;
        {
            let scheduler = Scheduler::new(self.layout, params.schedule, params.threads);
            let slots = ChunkSlots::new(&mut pixels, &self.layout, params.mode.bytes_per_pixel());
            let (scheduler, slots) = (&scheduler, &slots);
            let fork = Instant::now();
            let completed = crossbeam::scope(|spawner| {
                let handles: Vec<_> = (0..params.threads)
                    .map(|worker| spawner.spawn(move |_| self.work(worker, scheduler, slots)))
                    .collect();
                join_workers(handles)
            })
            .map_err(|_| RenderError::WorkerPanicked)
            .and_then(|completed| completed)?;
            debug_assert_eq!(completed, self.layout.slots());
            info!(
                chunks = completed,
                elapsed_ms = fork.elapsed().as_millis() as u64,
                "all workers joined"
            );
        }
        Ok(self.finish(pixels))
    }

    /// The single-threaded reference render: walks the image row by
    /// row with the scalar kernel, addressing pixels by `x, y` rather
    /// than by linear offset.
    pub fn render_single(&self) -> Result<PixelBuffer, RenderError> {
        let mut pixels = self.allocate()?;
        let limit = self.params.iterations;
        let unit = self.params.mode.bytes_per_pixel();
        let stride = self.params.width * unit;
        for (y, row) in pixels.chunks_mut(stride).enumerate() {
            for (x, pixel) in row.chunks_mut(unit).enumerate() {
                let steps = escape_steps(self.plane.pixel_to_point(&Pixel(x, y)), limit);
                self.paint(pixel, to_color(steps, limit));
            }
        }
        Ok(self.finish(pixels))
    }
}

// Join every worker, totalling the chunks they completed.  The first
// worker to have failed or panicked fails the whole render.
fn join_workers(handles: Vec<ScopedJoinHandle<Result<usize, RenderError>>>) -> Result<usize, RenderError> {
    let mut completed = 0;
    for handle in handles {
        match handle.join() {
            Ok(Ok(chunks)) => completed += chunks,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(RenderError::WorkerPanicked),
        }
    }
    Ok(completed)
}

/// Render `params` with worker threads.  The single entry point for
/// callers that do not need to keep the renderer around.
pub fn render(params: &RenderParameters) -> Result<PixelBuffer, RenderError> {
    MandelbrotRenderer::new(params.clone())?.render()
}
