extern crate mandelbrot;
extern crate num;

use mandelbrot::colors::{to_color, IN_SET};
use mandelbrot::escape::{escape_steps, escape_steps_batch, LANES};
use mandelbrot::planes::{Pixel, PlaneMapper};
use mandelbrot::{render, Kernel, MandelbrotRenderer, OutputMode, RenderError, RenderParameters, Schedule};
use num::Complex;

// 97 * 54 pixels leaves a short final batch of 54.
fn seahorse() -> RenderParameters {
    RenderParameters::new(97, 54)
        .with_center(Complex::new(-0.745, 0.11))
        .with_zoom(40.0)
        .with_iterations(400)
}

#[test]
fn kernels_agree_on_every_pixel_of_an_image() {
    let params = seahorse();
    let plane = PlaneMapper::from_params(&params).unwrap();
    let points: Vec<Complex<f64>> = (0..plane.len()).map(|i| plane.offset_to_point(i)).collect();
    assert!(points.len() % LANES != 0);
    for batch in points.chunks(LANES) {
        let last = batch.len() - 1;
        let mut re = [0f64; LANES];
        let mut im = [0f64; LANES];
        for k in 0..LANES {
            re[k] = batch[k.min(last)].re;
            im[k] = batch[k.min(last)].im;
        }
        let steps = escape_steps_batch(&re, &im, params.iterations);
        for (c, s) in batch.iter().zip(steps.iter()) {
            assert_eq!(*s, escape_steps(*c, params.iterations));
        }
    }
}

#[test]
fn render_matches_a_pixel_by_pixel_walk() {
    let params = seahorse().with_mode(OutputMode::Palette).with_threads(3).with_granularity(5);
    let plane = PlaneMapper::from_params(&params).unwrap();
    let image = render(&params).unwrap();
    for y in 0..params.height {
        for x in 0..params.width {
            let steps = escape_steps(plane.pixel_to_point(&Pixel(x, y)), params.iterations);
            assert_eq!(image.pixel(x, y)[0], to_color(steps, params.iterations));
        }
    }
}

#[test]
fn renders_are_identical_across_threads_and_schedules() {
    let reference = MandelbrotRenderer::new(seahorse().with_threads(1))
        .unwrap()
        .render_single()
        .unwrap();
    for &threads in &[1, 2, 5] {
        for &schedule in &[Schedule::Static, Schedule::Dynamic] {
            let params = seahorse()
                .with_threads(threads)
                .with_granularity(4)
                .with_schedule(schedule)
                .with_kernel(Kernel::Batched);
            assert!(render(&params).unwrap() == reference, "{} {:?}", threads, schedule);
        }
    }
}

#[test]
fn the_set_is_painted_in_set() {
    // The main cardioid around -0.25 is entirely inside the set.
    let params = RenderParameters::new(20, 20)
        .with_center(Complex::new(-0.2, 0.0))
        .with_zoom(20.0)
        .with_threads(2)
        .with_mode(OutputMode::Palette);
    let image = render(&params).unwrap();
    assert!(image.pixels.iter().all(|&p| p == IN_SET));
}

#[test]
fn configuration_errors_are_reported() {
    let err = render(&RenderParameters::new(3, 3).with_threads(5).with_granularity(2)).unwrap_err();
    assert_eq!(
        err,
        RenderError::TooManyChunks {
            granularity: 2,
            threads: 5,
            pixels: 9
        }
    );
    assert!(format!("{}", err).contains("exceeds"));
    assert_eq!(
        render(&RenderParameters::new(4, 4).with_zoom(0.0)).unwrap_err(),
        RenderError::InvalidZoom(0.0)
    );
}
