use nalgebra::{DMatrix, Matrix2, Point2, SymmetricEigen, Vector2};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MomentsError {
    #[error("Image is empty")]
    Empty,
    #[error("Image contains non-finite intensities")]
    NonFinite,
    #[error("Image has no intensity above its minimum")]
    Flat,
}

/// Centroid and second central moments of an image's intensity above its minimum.
///
/// `x` runs along columns and `y` along rows, both in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityMoments {
    pub centroid: Point2<f64>,
    pub covariance: Matrix2<f64>,
}

impl IntensityMoments {
    pub fn of(image: &DMatrix<f64>) -> Result<Self, MomentsError> {
        if image.is_empty() {
            return Err(MomentsError::Empty);
        }
        if image.iter().any(|v| !v.is_finite()) {
            return Err(MomentsError::NonFinite);
        }
        let floor = image.min();

        let (mut m00, mut m10, mut m01) = (0.0, 0.0, 0.0);
        let (mut m20, mut m02, mut m11) = (0.0, 0.0, 0.0);
        for (col, column) in image.column_iter().enumerate() {
            let x = col as f64;
            for (row, &value) in column.iter().enumerate() {
                let (w, y) = (value - floor, row as f64);
                m00 += w;
                m10 += w * x;
                m01 += w * y;
                m20 += w * x * x;
                m02 += w * y * y;
                m11 += w * x * y;
            }
        }
        if !(m00 > 0.0) {
            return Err(MomentsError::Flat);
        }

        let (xc, yc) = (m10 / m00, m01 / m00);
        let u20 = (m20 - xc * m10) / m00;
        let u02 = (m02 - yc * m01) / m00;
        let u11 = (m11 - xc * m01) / m00;
        Ok(Self {
            centroid: Point2::new(xc, yc),
            covariance: Matrix2::new(u20, u11, u11, u02),
        })
    }

    /// Angle of the major axis against the column direction, in degrees within `[-90, 90]`.
    pub fn principal_axis_angle(&self) -> f64 {
        let eig = SymmetricEigen::new(self.covariance);
        let major = if eig.eigenvalues[0] >= eig.eigenvalues[1] {
            eig.eigenvectors.column(0)
        } else {
            eig.eigenvectors.column(1)
        };
        if major[0] == 0.0 {
            90.0
        } else {
            (major[1] / major[0]).atan().to_degrees()
        }
    }
}

/// Rotation and shift that bring a filament upright and centered in its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    /// Degrees to rotate the image so that its major axis becomes vertical.
    pub rotation: f64,
    /// Pixels `(x, y)` moving the intensity centroid onto the box center.
    pub shift: Vector2<f64>,
}

/// Estimates the alignment of a straight filament from its intensity moments.
///
/// Only the estimate is produced; resampling the image is left to the caller.
pub fn estimate_alignment(image: &DMatrix<f64>) -> Result<Alignment, MomentsError> {
    let moments = IntensityMoments::of(image)?;
    let center = Point2::new(image.ncols() as f64 / 2.0, image.nrows() as f64 / 2.0);
    Ok(Alignment {
        rotation: moments.principal_axis_angle() - 90.0,
        shift: center - moments.centroid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    /// A one-pixel-wide bright line through `(x0, y0)` with slope `dy/dx` on a dark background.
    fn line_image(size: usize, x0: f64, y0: f64, direction: (f64, f64)) -> DMatrix<f64> {
        let (dx, dy) = direction;
        let norm = (dx * dx + dy * dy).sqrt();
        DMatrix::from_fn(size, size, |row, col| {
            let (x, y) = (col as f64 - x0, row as f64 - y0);
            let distance = (x * dy - y * dx).abs() / norm;
            if distance < 0.5 { 10.0 } else { 1.0 }
        })
    }

    #[test]
    fn vertical_filament_needs_no_rotation() {
        let image = line_image(32, 12.0, 16.0, (0.0, 1.0));
        let alignment = estimate_alignment(&image).unwrap();
        assert!(alignment.rotation.abs() < 1e-6 || (alignment.rotation + 180.0).abs() < 1e-6);
        assert!(close(alignment.shift.x, 4.0));
        assert!(close(alignment.shift.y, 0.5));
    }

    #[test]
    fn horizontal_filament_is_turned_by_a_right_angle() {
        let image = line_image(32, 16.0, 10.0, (1.0, 0.0));
        let moments = IntensityMoments::of(&image).unwrap();
        assert!(close(moments.centroid.y, 10.0));
        assert!(moments.covariance[(0, 0)] > moments.covariance[(1, 1)]);

        let alignment = estimate_alignment(&image).unwrap();
        assert!((alignment.rotation + 90.0).abs() < 1e-6);
        assert!(close(alignment.shift.y, 6.0));
    }

    #[test]
    fn diagonal_filament_axis_follows_its_slope() {
        let image = line_image(48, 24.0, 24.0, (1.0, 1.0));
        let moments = IntensityMoments::of(&image).unwrap();
        assert!((moments.principal_axis_angle() - 45.0).abs() < 1e-6);
        assert!(close(moments.covariance[(0, 1)], moments.covariance[(1, 0)]));
    }

    #[test]
    fn constant_offset_does_not_move_the_centroid() {
        let image = line_image(32, 20.0, 16.0, (0.0, 1.0));
        let brighter = image.add_scalar(250.0);
        assert_eq!(
            IntensityMoments::of(&image).unwrap(),
            IntensityMoments::of(&brighter).unwrap()
        );
    }

    #[test]
    fn degenerate_images_are_rejected() {
        assert_eq!(
            IntensityMoments::of(&DMatrix::zeros(0, 0)),
            Err(MomentsError::Empty)
        );
        assert_eq!(
            IntensityMoments::of(&DMatrix::from_element(4, 4, 3.0)),
            Err(MomentsError::Flat)
        );
        let mut image = DMatrix::from_element(4, 4, 1.0);
        image[(1, 2)] = f64::NAN;
        assert_eq!(IntensityMoments::of(&image), Err(MomentsError::NonFinite));
    }
}
