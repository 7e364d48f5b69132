//! Grid layout and cover-fit geometry.
//!
//! Pure math over canvas and video dimensions; recomputed on every frame.

use crate::models::geometry::Rect;

/// Grid geometry for a given number of active sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub count: usize,
    pub columns: usize,
    pub rows: usize,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl GridLayout {
    /// Column count for `count` sources: 1, then 2 up to four, then 3.
    pub fn columns_for(count: usize) -> usize {
        match count {
            0 | 1 => 1,
            2..=4 => 2,
            _ => 3,
        }
    }

    /// Lay out `count` sources over a `width` x `height` canvas.
    ///
    /// Returns None when there is nothing to lay out.
    pub fn compute(count: usize, width: f64, height: f64) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let columns = Self::columns_for(count);
        let rows = count.div_ceil(columns);
        Some(Self {
            count,
            columns,
            rows,
            cell_width: width / columns as f64,
            cell_height: height / rows as f64,
        })
    }

    /// Row-major cell for the source at `index`.
    pub fn cell(&self, index: usize) -> Option<Rect> {
        if index >= self.count {
            return None;
        }
        let column = index % self.columns;
        let row = index / self.columns;
        Some(Rect::new(
            column as f64 * self.cell_width,
            row as f64 * self.cell_height,
            self.cell_width,
            self.cell_height,
        ))
    }

    pub fn cells(&self) -> impl Iterator<Item = Rect> + '_ {
        (0..self.count).filter_map(move |i| self.cell(i))
    }
}

/// Source crop for drawing a `video_width` x `video_height` frame into `cell`
/// so that the cell is fully covered, trimming the overflowing axis equally
/// on both sides.
///
/// Returns None for degenerate sizes.
pub fn cover_fit(video_width: f64, video_height: f64, cell: &Rect) -> Option<Rect> {
    if video_width <= 0.0 || video_height <= 0.0 || cell.width <= 0.0 || cell.height <= 0.0 {
        return None;
    }
    let scale = cover_scale(video_width, video_height, cell);
    let crop_width = cell.width / scale;
    let crop_height = cell.height / scale;
    Some(Rect::new(
        (video_width - crop_width) / 2.0,
        (video_height - crop_height) / 2.0,
        crop_width,
        crop_height,
    ))
}

pub fn cover_scale(video_width: f64, video_height: f64, cell: &Rect) -> f64 {
    (cell.width / video_width).max(cell.height / video_height)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn column_counts() {
        let expected = [(1, 1), (2, 2), (3, 2), (4, 2), (5, 3), (6, 3), (7, 3)];
        for (count, columns) in expected {
            assert_eq!(GridLayout::columns_for(count), columns, "count {}", count);
        }
    }

    #[test]
    fn rows_and_unique_cells() {
        for count in 1..=7 {
            let grid = GridLayout::compute(count, 1280.0, 720.0).unwrap();
            assert_eq!(grid.rows, count.div_ceil(grid.columns));

            let cells: Vec<Rect> = grid.cells().collect();
            assert_eq!(cells.len(), count);
            for (i, a) in cells.iter().enumerate() {
                assert!(a.right() <= 1280.0 + 1e-9 && a.bottom() <= 720.0 + 1e-9);
                for b in cells.iter().skip(i + 1) {
                    assert!(!a.overlaps(b), "count {}: {:?} overlaps {:?}", count, a, b);
                }
            }
        }
    }

    #[test]
    fn four_sources_form_two_by_two() {
        let grid = GridLayout::compute(4, 1280.0, 720.0).unwrap();
        assert_eq!((grid.columns, grid.rows), (2, 2));
        assert_eq!(grid.cell(0), Some(Rect::new(0.0, 0.0, 640.0, 360.0)));
        assert_eq!(grid.cell(3), Some(Rect::new(640.0, 360.0, 640.0, 360.0)));
        assert_eq!(grid.cell(4), None);
    }

    #[test]
    fn single_source_fills_canvas() {
        let grid = GridLayout::compute(1, 1280.0, 720.0).unwrap();
        assert_eq!(grid.cell(0), Some(Rect::new(0.0, 0.0, 1280.0, 720.0)));
    }

    #[test]
    fn no_sources_no_grid() {
        assert!(GridLayout::compute(0, 1280.0, 720.0).is_none());
    }

    #[test]
    fn cover_fit_crops_wide_video_horizontally() {
        let cell = Rect::new(0.0, 0.0, 640.0, 360.0);
        // 4:3 camera into a 16:9 cell: width fits, height is cropped
        let crop = cover_fit(640.0, 480.0, &cell).unwrap();
        assert_relative_eq!(cover_scale(640.0, 480.0, &cell), 1.0);
        assert_relative_eq!(crop.width, 640.0);
        assert_relative_eq!(crop.height, 360.0);
        assert_relative_eq!(crop.y, 60.0);
        assert_relative_eq!(crop.x, 0.0);
    }

    #[test]
    fn cover_fit_preserves_cell_aspect_and_centres() {
        let sizes = [(1920.0, 1080.0), (640.0, 480.0), (480.0, 640.0), (333.0, 777.0)];
        let cells = [
            Rect::new(0.0, 0.0, 1280.0, 720.0),
            Rect::new(426.0, 240.0, 426.6, 240.0),
            Rect::new(0.0, 0.0, 100.0, 300.0),
        ];
        for &(vw, vh) in &sizes {
            for cell in &cells {
                let crop = cover_fit(vw, vh, cell).unwrap();
                assert_relative_eq!(crop.aspect_ratio(), cell.aspect_ratio(), max_relative = 1e-9);
                assert_relative_eq!(crop.x, vw - crop.right(), epsilon = 1e-9);
                assert_relative_eq!(crop.y, vh - crop.bottom(), epsilon = 1e-9);
                assert!(crop.width <= vw + 1e-9 && crop.height <= vh + 1e-9);
            }
        }
    }

    #[test]
    fn cover_fit_rejects_degenerate_sizes() {
        let cell = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(cover_fit(0.0, 10.0, &cell).is_none());
        assert!(cover_fit(10.0, 10.0, &Rect::new(0.0, 0.0, 0.0, 10.0)).is_none());
    }
}
