//! Map file format
//!
//! A saved map is a JSON object:
//!
//! ```json
//! { "textures": ["Solid(color:(255,0,0,255),shape:Rect)"],
//!   "data": "[[[0,1],null,[0,2]]]",
//!   "dataXY": [-4, 0] }
//! ```
//!
//! `data` is itself a JSON string of rows where
//! `data[y - dataY][x - dataX]` holds `[textureIndex, cell]` or `null`.
//! `dataXY` is the smallest painted coordinate, capped at zero, so negative
//! coordinates survive the trip through plain arrays.

use serde::{Deserialize, Serialize};

use super::grid::{TileEntry, TileGrid, TileSource};
use crate::error::{MapError, Result};

/// One row of tiles; `None` marks an unpainted column
type Row = Vec<Option<TileEntry>>;

/// On-disk representation of a texture map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapFile {
    /// Serialized texture descriptors, in index order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textures: Option<Vec<String>>,
    /// Row data as a JSON string
    pub data: String,
    /// Coordinate of `data[0][0]`
    #[serde(rename = "dataXY", default)]
    pub data_xy: (i32, i32),
}

impl MapFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the tile data into a grid
    pub fn grid(&self) -> Result<TileGrid> {
        decode_grid(&self.data, self.data_xy)
    }
}

/// Most rows or columns a saved map may cover
const MAX_SPAN: i64 = 1 << 16;

/// Encode a grid as a row string and the offset of its first cell
pub fn encode_grid(grid: &TileGrid) -> Result<(String, (i32, i32))> {
    let Some((min, max)) = grid.bounds() else {
        return Ok(("[]".to_string(), (0, 0)));
    };

    let (data_x, data_y) = (min.x.min(0), min.y.min(0));
    span(data_x, max.x)?;
    let height = span(data_y, max.y)?;
    let mut rows: Vec<Option<Row>> = vec![None; height];

    for (coord, entry) in grid.tiles() {
        let row = rows[(coord.y as i64 - data_y as i64) as usize].get_or_insert_with(Vec::new);
        let col = (coord.x as i64 - data_x as i64) as usize;
        if row.len() <= col {
            row.resize(col + 1, None);
        }
        row[col] = Some(entry);
    }

    Ok((serde_json::to_string(&rows)?, (data_x, data_y)))
}

/// Decode a row string anchored at `offset` into a grid
pub fn decode_grid(data: &str, offset: (i32, i32)) -> Result<TileGrid> {
    let rows: Vec<Option<Row>> = serde_json::from_str(data)?;
    let (data_x, data_y) = offset;
    let mut grid = TileGrid::new();

    for (y, row) in rows.iter().enumerate() {
        let Some(row) = row else {
            continue;
        };
        for (x, entry) in row.iter().enumerate() {
            let Some(entry) = entry else {
                continue;
            };
            let tx = to_coord(x, data_x)?;
            let ty = to_coord(y, data_y)?;
            grid.set_tile(tx, ty, *entry);
        }
    }

    Ok(grid)
}

/// Transpose column-major `data[x][y]` rows from the older format into
/// the current `data[y][x]` layout
pub fn convert_legacy_data(data: &str) -> Result<String> {
    let columns: Vec<Option<Row>> = serde_json::from_str(data)?;
    let mut rows: Vec<Option<Row>> = Vec::new();

    for (x, column) in columns.iter().enumerate() {
        let Some(column) = column else {
            continue;
        };
        for (y, entry) in column.iter().enumerate() {
            let Some(entry) = entry else {
                continue;
            };
            if rows.len() <= y {
                rows.resize(y + 1, None);
            }
            let row = rows[y].get_or_insert_with(Vec::new);
            if row.len() <= x {
                row.resize(x + 1, None);
            }
            row[x] = Some(*entry);
        }
    }

    Ok(serde_json::to_string(&rows)?)
}

/// Number of cells from `from` to `to` inclusive, if small enough to store
fn span(from: i32, to: i32) -> Result<usize> {
    let count = to as i64 - from as i64 + 1;
    if count > MAX_SPAN {
        return Err(MapError::InvalidData(format!(
            "tiles from {} to {} span {} cells, more than {} fit in a saved map",
            from, to, count, MAX_SPAN
        )));
    }
    Ok(count as usize)
}

fn to_coord(index: usize, offset: i32) -> Result<i32> {
    i32::try_from(index)
        .ok()
        .and_then(|i| i.checked_add(offset))
        .ok_or_else(|| MapError::InvalidData(format!("tile index {} out of range", index)))
}
