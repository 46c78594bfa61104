//! Boolean occupancy grid over the normalized map square [-1, 1] x [-1, 1].
//!
//! Cell `(i, j)` covers the continuous point `(2i/R - 1, 2j/R - 1)`; the
//! forward mapping rounds, so a coordinate round trip is only exact up to one
//! cell. Rasters are exchanged on disk as plain PBM (`P1`) bitmaps where
//! row `i` is the x index and column `j` the y index.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::debug;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::common::{PlannerError, PlannerResult, Point2D};

/// Default number of cells per side
pub const DEFAULT_RESOLUTION: usize = 101;

/// Grid section of the simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cells per side of the square grid
    pub resolution: usize,
    /// Optional PBM raster loaded at start-up
    pub raster: Option<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            raster: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    resolution: usize,
    cells: DMatrix<bool>,
}

impl OccupancyGrid {
    /// Create an empty (fully free) grid
    pub fn new(resolution: usize) -> PlannerResult<Self> {
        if resolution == 0 {
            return Err(PlannerError::InvalidParameter(
                "grid resolution must be >= 1".to_string(),
            ));
        }
        Ok(Self {
            resolution,
            cells: DMatrix::from_element(resolution, resolution, false),
        })
    }

    /// Wrap an existing occupancy matrix; it must be square
    pub fn from_matrix(cells: DMatrix<bool>) -> PlannerResult<Self> {
        if cells.nrows() != cells.ncols() || cells.nrows() == 0 {
            return Err(PlannerError::InvalidParameter(format!(
                "occupancy matrix must be square and non-empty, got {}x{}",
                cells.nrows(),
                cells.ncols()
            )));
        }
        Ok(Self {
            resolution: cells.nrows(),
            cells,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn cells(&self) -> &DMatrix<bool> {
        &self.cells
    }

    /// Cell index of a continuous coordinate: `round((coord + 1) * R / 2)`
    pub fn cell_index(&self, coord: f64) -> i64 {
        ((coord + 1.0) * self.resolution as f64 / 2.0).round() as i64
    }

    /// Continuous coordinate of a cell index: `2 * index / R - 1`
    pub fn cell_coord(&self, index: i64) -> f64 {
        2.0 * index as f64 / self.resolution as f64 - 1.0
    }

    pub fn to_cell(&self, point: Point2D) -> (i64, i64) {
        (self.cell_index(point.x), self.cell_index(point.y))
    }

    pub fn to_point(&self, i: i64, j: i64) -> Point2D {
        Point2D::new(self.cell_coord(i), self.cell_coord(j))
    }

    /// Side length of one cell in map units
    pub fn cell_size(&self) -> f64 {
        2.0 / self.resolution as f64
    }

    /// Half-width of the query window in cells: `round(radius * R / 2)`
    pub fn radius_in_cells(&self, radius: f64) -> i64 {
        (radius * self.resolution as f64 / 2.0).round().max(0.0) as i64
    }

    fn checked(&self, i: i64, j: i64) -> Option<(usize, usize)> {
        let r = self.resolution as i64;
        if i < 0 || j < 0 || i >= r || j >= r {
            None
        } else {
            Some((i as usize, j as usize))
        }
    }

    /// Occupancy of a single cell; cells outside the map are free
    pub fn is_cell_occupied(&self, i: i64, j: i64) -> bool {
        self.checked(i, j).map_or(false, |idx| self.cells[idx])
    }

    /// True if any occupied cell lies in the square window of half-width
    /// `radius_in_cells(radius)` around the cell containing `point`.
    ///
    /// The window is clipped to the map.
    pub fn is_blocked(&self, point: Point2D, radius: f64) -> bool {
        let (i, j) = self.to_cell(point);
        let r = self.radius_in_cells(radius);
        let last = self.resolution as i64 - 1;

        let (i0, i1) = ((i - r).max(0), (i + r).min(last));
        let (j0, j1) = ((j - r).max(0), (j + r).min(last));
        if i0 > i1 || j0 > j1 {
            return false;
        }

        let shape = ((i1 - i0 + 1) as usize, (j1 - j0 + 1) as usize);
        self.cells
            .view((i0 as usize, j0 as usize), shape)
            .iter()
            .any(|&occupied| occupied)
    }

    /// Mark the cell containing `point` as occupied.
    ///
    /// Returns whether the cell changed; out-of-range points are ignored.
    pub fn set_occupied(&mut self, point: Point2D) -> bool {
        self.write_cell(point, true)
    }

    /// Mark the cell containing `point` as free.
    ///
    /// Returns whether the cell changed; out-of-range points are ignored.
    pub fn clear_occupied(&mut self, point: Point2D) -> bool {
        self.write_cell(point, false)
    }

    fn write_cell(&mut self, point: Point2D, occupied: bool) -> bool {
        let (i, j) = self.to_cell(point);
        match self.checked(i, j) {
            Some(idx) if self.cells[idx] != occupied => {
                self.cells[idx] = occupied;
                true
            }
            _ => false,
        }
    }

    /// Set every cell to the same state
    pub fn fill(&mut self, occupied: bool) {
        self.cells.fill(occupied);
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&occupied| occupied).count()
    }

    /// Continuous coordinates of every occupied cell
    pub fn occupied_points(&self) -> Vec<Point2D> {
        let mut points = Vec::with_capacity(self.occupied_count());
        for i in 0..self.resolution {
            for j in 0..self.resolution {
                if self.cells[(i, j)] {
                    points.push(self.to_point(i as i64, j as i64));
                }
            }
        }
        points
    }

    /// Load a PBM raster from disk
    pub fn load<P: AsRef<Path>>(path: P) -> PlannerResult<Self> {
        let path = path.as_ref();
        let grid = Self::read_from(BufReader::new(File::open(path)?))?;
        debug!(
            "loaded {}x{} occupancy grid ({} occupied) from {}",
            grid.resolution,
            grid.resolution,
            grid.occupied_count(),
            path.display()
        );
        Ok(grid)
    }

    /// Save the grid as a PBM raster
    pub fn save<P: AsRef<Path>>(&self, path: P) -> PlannerResult<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        debug!("saved occupancy grid to {}", path.display());
        Ok(())
    }

    /// Parse an ASCII PBM (`P1`) bitmap; `1` marks an occupied cell
    pub fn read_from<R: Read>(mut reader: R) -> PlannerResult<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        let body = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n");
        let mut tokens = body.split_whitespace();

        match tokens.next() {
            Some("P1") => {}
            Some(other) => {
                return Err(PlannerError::MapFormat(format!(
                    "expected PBM magic 'P1', found '{}'",
                    other
                )))
            }
            None => return Err(PlannerError::MapFormat("empty raster".to_string())),
        }

        let mut dimension = |name: &str| -> PlannerResult<usize> {
            tokens
                .next()
                .ok_or_else(|| PlannerError::MapFormat(format!("missing {}", name)))?
                .parse::<usize>()
                .map_err(|e| PlannerError::MapFormat(format!("invalid {}: {}", name, e)))
        };
        let width = dimension("width")?;
        let height = dimension("height")?;
        if width != height {
            return Err(PlannerError::MapFormat(format!(
                "occupancy raster must be square, got {}x{}",
                width, height
            )));
        }

        let bits = tokens
            .flat_map(str::chars)
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(PlannerError::MapFormat(format!("unexpected pixel '{}'", other))),
            })
            .collect::<PlannerResult<Vec<bool>>>()?;
        if bits.len() != width * height {
            return Err(PlannerError::MapFormat(format!(
                "expected {} pixels, found {}",
                width * height,
                bits.len()
            )));
        }

        Self::from_matrix(DMatrix::from_row_slice(height, width, &bits))
    }

    /// Write the grid as an ASCII PBM (`P1`) bitmap
    pub fn write_to<W: Write>(&self, writer: &mut W) -> PlannerResult<()> {
        writeln!(writer, "P1")?;
        writeln!(writer, "# occupancy grid: row = x index, column = y index")?;
        writeln!(writer, "{} {}", self.resolution, self.resolution)?;
        for row in self.cells.row_iter() {
            let line = row
                .iter()
                .map(|&occupied| if occupied { "1" } else { "0" })
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> OccupancyGrid {
        OccupancyGrid::new(DEFAULT_RESOLUTION).unwrap()
    }

    #[test]
    fn test_coordinate_round_trip_within_one_cell() {
        let grid = grid();
        let steps = 200;
        for a in 0..steps {
            for b in 0..steps {
                // stay inside the cells that exist: index R would fall off the map
                let x = -1.0 + 1.98 * a as f64 / steps as f64;
                let y = -1.0 + 1.98 * b as f64 / steps as f64;
                let (i, j) = grid.to_cell(Point2D::new(x, y));
                assert!(grid.checked(i, j).is_some());
                let back = grid.to_point(i, j);
                assert!((back.x - x).abs() <= grid.cell_size());
                assert!((back.y - y).abs() <= grid.cell_size());
            }
        }
    }

    #[test]
    fn test_cell_index_mapping() {
        let grid = grid();
        assert_eq!(grid.cell_index(-1.0), 0);
        assert_eq!(grid.cell_index(0.0), 51); // round(50.5) rounds away from zero
        assert!((grid.cell_coord(0) + 1.0).abs() < 1e-12);
        assert_eq!(grid.radius_in_cells(0.02), 1);
    }

    #[test]
    fn test_set_and_clear_are_idempotent() {
        let mut grid = grid();
        let p = Point2D::new(0.3, -0.4);

        assert!(!grid.is_blocked(p, 0.0));
        assert!(grid.set_occupied(p));
        assert!(!grid.set_occupied(p));
        assert!(grid.is_blocked(p, 0.0));
        assert_eq!(grid.occupied_count(), 1);

        assert!(grid.clear_occupied(p));
        assert!(!grid.clear_occupied(p));
        assert!(!grid.is_blocked(p, 0.0));
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_out_of_range_mutation_is_noop() {
        let mut grid = grid();
        assert!(!grid.set_occupied(Point2D::new(1.5, 0.0)));
        assert!(!grid.set_occupied(Point2D::new(0.0, -1.5)));
        assert!(!grid.set_occupied(Point2D::new(1.0, 0.0))); // index R
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    fn test_is_blocked_uses_square_window() {
        let mut grid = grid();
        let center = Point2D::new(0.0, 0.0);
        let (i, j) = grid.to_cell(center);
        // diagonal neighbour: inside a box of half-width 1, outside a circle test of radius 1
        let corner = grid.to_point(i + 1, j + 1);
        grid.set_occupied(corner);

        assert!(grid.is_blocked(center, 0.02));
        assert!(!grid.is_blocked(center, 0.0));

        let far = grid.to_point(i + 2, j);
        assert!(!grid.is_blocked(far, 0.0));
        assert!(grid.is_blocked(far, 0.02));
    }

    #[test]
    fn test_window_clipped_at_border() {
        let mut grid = grid();
        grid.set_occupied(Point2D::new(-1.0, -1.0));
        assert!(grid.is_blocked(Point2D::new(-1.01, -1.01), 0.02));
        assert!(!grid.is_blocked(Point2D::new(-1.2, -1.2), 0.02));
    }

    #[test]
    fn test_pbm_round_trip_preserves_cells() {
        let mut grid = OccupancyGrid::new(7).unwrap();
        grid.set_occupied(Point2D::new(-1.0, -1.0));
        grid.set_occupied(Point2D::new(0.1, 0.4));

        let mut bytes = Vec::new();
        grid.write_to(&mut bytes).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("P1"));

        let loaded = OccupancyGrid::read_from(bytes.as_slice()).unwrap();
        assert_eq!(loaded, grid);
    }

    #[test]
    fn test_pbm_accepts_packed_pixels_and_comments() {
        let raster = "P1\n# tiny\n3 3\n100\n010 # centre\n001\n";
        let grid = OccupancyGrid::read_from(raster.as_bytes()).unwrap();
        assert_eq!(grid.resolution(), 3);
        assert_eq!(grid.occupied_count(), 3);
        assert!(grid.is_cell_occupied(1, 1));
        assert!(!grid.is_cell_occupied(0, 1));
    }

    #[test]
    fn test_pbm_rejects_bad_input() {
        assert!(matches!(
            OccupancyGrid::read_from("P4\n1 1\n0".as_bytes()),
            Err(PlannerError::MapFormat(_))
        ));
        assert!(matches!(
            OccupancyGrid::read_from("P1\n2 3\n000000".as_bytes()),
            Err(PlannerError::MapFormat(_))
        ));
        assert!(matches!(
            OccupancyGrid::read_from("P1\n2 2\n010".as_bytes()),
            Err(PlannerError::MapFormat(_))
        ));
    }

    #[test]
    fn test_zero_resolution_rejected() {
        assert!(OccupancyGrid::new(0).is_err());
        assert!(OccupancyGrid::from_matrix(DMatrix::from_element(2, 3, false)).is_err());
    }
}
