// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane with an arbitrary pair of
//! corners defining the leftlower and rightupper corners of the
//! rendered region.
use num::Complex;

use errors::RenderError;
use params::RenderParameters;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.  For that reason,
/// the lower-left-hand corner is not included.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the x, y of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// The rendered region of the complex plane, treating the real part
/// of each corner as the x-component and the imaginary part as the
/// y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    /// The corner with the smallest real and imaginary parts
    pub leftlower: Complex<f64>,
    /// The corner with the largest real and imaginary parts
    pub rightupper: Complex<f64>,
}

impl Viewport {
    /// Takes the two corners of the region.  Fails unless `rightupper`
    /// lies strictly above and to the right of `leftlower`.
    pub fn new(leftlower: Complex<f64>, rightupper: Complex<f64>) -> Result<Viewport, RenderError> {
        let viewport = Viewport {
            leftlower,
            rightupper,
        };
        let (dx, dy) = viewport.deltas();
        if dx > 0.0 && dy > 0.0 && dx.is_finite() && dy.is_finite() {
            Ok(viewport)
        } else {
            Err(RenderError::DegenerateViewport(
                leftlower.to_string(),
                rightupper.to_string(),
            ))
        }
    }

    /// The region seen at `zoom` around `center` for an image of the
    /// given aspect ratio (height / width).  At zoom 1.0 the real axis
    /// spans -2 to 2; the imaginary span is scaled by the aspect ratio.
    pub fn around(center: Complex<f64>, zoom: f64, aspect: f64) -> Result<Viewport, RenderError> {
        let half = 2.0 / zoom;
        Viewport::new(
            Complex::new(-half, -half * aspect) + center,
            Complex::new(half, half * aspect) + center,
        )
    }

    /// The viewport described by a set of render parameters.
    pub fn from_params(params: &RenderParameters) -> Result<Viewport, RenderError> {
        let aspect = params.height as f64 / params.width as f64;
        Viewport::around(params.center, params.zoom, aspect)
    }

    /// Width and height of the region, `rightupper - leftlower`.
    pub fn deltas(&self) -> (f64, f64) {
        (
            self.rightupper.re - self.leftlower.re,
            self.rightupper.im - self.leftlower.im,
        )
    }
}

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a complex cartesian plane.  Maps pixels from the one to points
/// on the other.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The region of the complex plane being rendered.
    pub viewport: Viewport,
    // Cached `viewport.deltas()`.
    deltas: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the
    /// viewport it maps onto.
    pub fn new(width: usize, height: usize, viewport: Viewport) -> PlaneMapper {
        PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            viewport,
            deltas: viewport.deltas(),
        }
    }

    /// Builds the mapper for a set of render parameters.
    pub fn from_params(params: &RenderParameters) -> Result<PlaneMapper, RenderError> {
        let viewport = Viewport::from_params(params)?;
        Ok(PlaneMapper::new(params.width, params.height, viewport))
    }

    /// The total number of points in the integral grid.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given a pixel on the integral cartesian plane, map it to its
    /// point on the complex cartesian plane.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let fx = pixel.0 as f64 / self.integral_plane.0 as f64;
        let fy = pixel.1 as f64 / self.integral_plane.1 as f64;
        Complex::new(
            self.viewport.leftlower.re + fx * self.deltas.0,
            self.viewport.leftlower.im + fy * self.deltas.1,
        )
    }

    /// Given a linear offset into a row-major image, return the pixel
    /// it addresses.
    #[inline]
    pub fn offset_to_pixel(&self, offset: usize) -> Pixel {
        Pixel(offset % self.integral_plane.0, offset / self.integral_plane.0)
    }

    /// Given a linear offset into a row-major image, return the point
    /// on the complex plane for that pixel.
    #[inline]
    pub fn offset_to_point(&self, offset: usize) -> Complex<f64> {
        self.pixel_to_point(&self.offset_to_pixel(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::iproduct;

    fn square(side: usize) -> PlaneMapper {
        let vp = Viewport::new(Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0)).unwrap();
        PlaneMapper::new(side, side, vp)
    }

    #[test]
    fn viewport_fails_on_bad_shape() {
        assert!(Viewport::new(Complex::new(-1.0, 1.0), Complex::new(1.0, -1.0)).is_err());
        assert!(Viewport::new(Complex::new(1.0, -1.0), Complex::new(-1.0, 1.0)).is_err());
        assert!(Viewport::new(Complex::new(0.0, 0.0), Complex::new(0.0, 1.0)).is_err());
    }

    #[test]
    fn viewport_passes_on_good_shape() {
        assert!(Viewport::new(Complex::new(-1.0, -1.0), Complex::new(1.0, 1.0)).is_ok());
    }

    #[test]
    fn viewport_follows_zoom_aspect_and_center() {
        let vp = Viewport::around(Complex::new(0.0, 0.0), 1.0, 1.0).unwrap();
        assert_eq!(vp.leftlower, Complex::new(-2.0, -2.0));
        assert_eq!(vp.rightupper, Complex::new(2.0, 2.0));

        let vp = Viewport::around(Complex::new(-0.5, 0.25), 2.0, 0.5).unwrap();
        assert_eq!(vp.leftlower, Complex::new(-1.5, -0.25));
        assert_eq!(vp.rightupper, Complex::new(0.5, 0.75));
        assert_eq!(vp.deltas(), (2.0, 1.0));
    }

    #[test]
    fn viewport_from_params_uses_height_over_width() {
        let p = RenderParameters::new(400, 200).with_zoom(0.5);
        let vp = Viewport::from_params(&p).unwrap();
        assert_eq!(vp.leftlower, Complex::new(-4.0, -2.0));
        assert_eq!(vp.rightupper, Complex::new(4.0, 2.0));
    }

    #[test]
    fn viewport_rejects_precision_collapse() {
        assert!(Viewport::around(Complex::new(1.0e10, 0.0), 1.0e300, 1.0).is_err());
    }

    #[test]
    fn pixel_to_point_on_positive_planes() {
        let vp = Viewport::new(Complex::new(0.0, 0.0), Complex::new(5.0, 5.0)).unwrap();
        let pm = PlaneMapper::new(5, 5, vp);
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(2.0, 2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(4, 4)), Complex::new(4.0, 4.0));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let pm = square(4);
        assert_eq!(pm.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(pm.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(pm.pixel_to_point(&Pixel(3, 1)), Complex::new(1.0, -1.0));
    }

    #[test]
    fn linear_and_planar_addressing_agree() {
        let vp = Viewport::around(Complex::new(0.3, -0.1), 1.7, 5.0 / 7.0).unwrap();
        let pm = PlaneMapper::new(7, 5, vp);
        for (y, x) in iproduct!(0..5, 0..7) {
            let offset = y * 7 + x;
            assert_eq!(pm.offset_to_pixel(offset), Pixel(x, y));
            assert_eq!(pm.offset_to_point(offset), pm.pixel_to_point(&Pixel(x, y)));
        }
    }

    #[test]
    fn len_counts_pixels() {
        let pm = square(640);
        assert_eq!(pm.len(), 640 * 640);
        assert!(!pm.is_empty());
    }
}
