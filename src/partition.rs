// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Splitting an image into chunks of work, and handing those chunks
//! out to worker threads.
//!
//! The image is cut into `chunks_count` chunks of `chunk_size` pixels
//! each, plus one trailing remainder chunk when the pixel count does
//! not divide evenly.  Chunk indices are claimed either by static
//! striping (worker `t` of `T` takes `t, t + T, t + 2T, ...`) or from
//! a shared atomic counter.  Under both policies the claims are
//! unique and increasing, so exactly one worker ever sees the index
//! one past the last full chunk, and that worker, and only that
//! worker, takes the remainder.
//!
//! Chunk ranges are measured in pixels.  The byte slices handed to
//! workers are those ranges scaled by the bytes-per-pixel of the
//! output, so the same layout serves RGB and palette buffers alike.

use crossbeam::atomic::AtomicCell;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use errors::RenderError;
use params::Schedule;

/// How a run of `total` pixels is cut into chunks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChunkLayout {
    /// Pixels in the whole image
    pub total: usize,
    /// Pixels in every full chunk
    pub chunk_size: usize,
    /// Number of full chunks
    pub chunks_count: usize,
    /// Pixels left over after the full chunks; zero if none
    pub remainder: usize,
}

impl ChunkLayout {
    /// Cut `total` pixels into roughly `granularity * threads` chunks.
    /// Fails if that many chunks would leave a chunk with no pixels.
    pub fn new(total: usize, granularity: usize, threads: usize) -> Result<ChunkLayout, RenderError> {
        let wanted = granularity.checked_mul(threads).unwrap_or(0);
        if wanted == 0 || wanted > total {
            return Err(RenderError::TooManyChunks {
                granularity,
                threads,
                pixels: total,
            });
        }
        ChunkLayout::with_chunk_size(total, total / wanted)
    }

    /// Cut `total` pixels into chunks of exactly `chunk_size`, plus a
    /// remainder.
    pub fn with_chunk_size(total: usize, chunk_size: usize) -> Result<ChunkLayout, RenderError> {
        if chunk_size == 0 {
            return Err(RenderError::ZeroChunkSize);
        }
        Ok(ChunkLayout {
            total,
            chunk_size,
            chunks_count: total / chunk_size,
            remainder: total % chunk_size,
        })
    }

    /// Number of chunk slots, counting the remainder chunk if there is
    /// one.
    pub fn slots(&self) -> usize {
        self.chunks_count + if self.remainder > 0 { 1 } else { 0 }
    }

    /// The pixel range covered by chunk `index`.  Index
    /// `chunks_count` is the remainder chunk when there is one.
    pub fn chunk(&self, index: usize) -> Option<Range<usize>> {
        if index < self.chunks_count {
            Some(index * self.chunk_size..(index + 1) * self.chunk_size)
        } else if index == self.chunks_count && self.remainder > 0 {
            Some(index * self.chunk_size..self.total)
        } else {
            None
        }
    }
}

/// The claim state of one render.  Owns the shared counter used by
/// dynamic scheduling; dropped when the render finishes.
#[derive(Debug)]
pub struct Scheduler {
    layout: ChunkLayout,
    schedule: Schedule,
    threads: usize,
    claimed: AtomicUsize,
}

impl Scheduler {
    /// A fresh scheduler for `threads` workers.
    pub fn new(layout: ChunkLayout, schedule: Schedule, threads: usize) -> Scheduler {
        Scheduler {
            layout,
            schedule,
            threads,
            claimed: AtomicUsize::new(0),
        }
    }

    /// The sequence of chunk indices worker `worker` will process.
    pub fn claims(&self, worker: usize) -> Claims {
        let source = match self.schedule {
            Schedule::Static => Source::Striped {
                next: worker,
                stride: self.threads,
            },
            Schedule::Dynamic => Source::Shared(&self.claimed),
        };
        Claims {
            layout: self.layout,
            source,
            done: false,
        }
    }
}

#[derive(Debug)]
enum Source<'a> {
    Striped { next: usize, stride: usize },
    Shared(&'a AtomicUsize),
}

/// An iterator over the chunk indices claimed by a single worker.
/// Yields every full chunk the worker wins, then the remainder chunk
/// if the first index it fails to win is exactly `chunks_count`.
#[derive(Debug)]
pub struct Claims<'a> {
    layout: ChunkLayout,
    source: Source<'a>,
    done: bool,
}

impl<'a> Iterator for Claims<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        let index = match self.source {
            Source::Striped {
                ref mut next,
                stride,
            } => {
                let index = *next;
                *next += stride;
                index
            }
            Source::Shared(counter) => counter.fetch_add(1, Ordering::Relaxed),
        };
        if index < self.layout.chunks_count {
            return Some(index);
        }
        self.done = true;
        if index == self.layout.chunks_count && self.layout.remainder > 0 {
            Some(index)
        } else {
            None
        }
    }
}

/// The output buffer, cut into one disjoint slice per chunk slot.
/// A slice can be taken exactly once; whoever takes it owns it for the
/// rest of the render.
pub struct ChunkSlots<'a> {
    slots: Vec<AtomicCell<Option<&'a mut [u8]>>>,
}

impl<'a> ChunkSlots<'a> {
    /// Cut `buffer` along `layout`, with `unit` bytes per pixel.
    pub fn new(buffer: &'a mut [u8], layout: &ChunkLayout, unit: usize) -> ChunkSlots<'a> {
        debug_assert_eq!(buffer.len(), layout.total * unit);
        let slots = buffer
            .chunks_mut(layout.chunk_size * unit)
            .map(|slice| AtomicCell::new(Some(slice)))
            .collect();
        ChunkSlots { slots }
    }

    /// Number of slices, taken or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if the buffer was empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Take the slice for chunk `index`.  Returns `None` if it does not
    /// exist or has already been taken.
    pub fn take(&self, index: usize) -> Option<&'a mut [u8]> {
        self.slots.get(index).and_then(|slot| slot.swap(None))
    }
}
