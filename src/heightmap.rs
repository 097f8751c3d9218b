//! Terrain subsystem: TerrainSource trait, the per-room Heightmap grid and
//! its two resource formats.

use crate::types::TileCoord;
use thiserror::Error;

/// Cells with a walkable class at or above this value block movement.
pub const BLOCKING_CLASS: u8 = 4;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HeightmapError {
    #[error("heightmap source contains no cells")]
    Empty,
    #[error("malformed heightmap header: {0:?}")]
    MalformedHeader(String),
    #[error("malformed cell code {code:?} at row {row}, column {col}")]
    MalformedCode { row: usize, col: usize, code: String },
    #[error("row {row} has {found} cells, expected {expected}")]
    InconsistentRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can answer per-tile terrain queries.
///
/// Out-of-range lookups return `None`; callers treat that as blocked.
pub trait TerrainSource {
    fn cell(&self, x: i32, y: i32) -> Option<HeightmapCell>;
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    fn cell_at(&self, coord: TileCoord) -> Option<HeightmapCell> {
        self.cell(coord.x, coord.y)
    }

    /// Ground height of a cell in world pixels.
    fn ground_height(&self, x: i32, y: i32, tile_size: f32) -> Option<f32> {
        self.cell(x, y).map(|c| c.height as f32 * tile_size)
    }
}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeightmapCell {
    /// Ground height in tiles.
    pub height: u16,
    /// Walkable class; anything below [`BLOCKING_CLASS`] is traversable.
    pub walkable: u8,
}

impl HeightmapCell {
    pub fn new(height: u16, walkable: u8) -> Self {
        Self { height, walkable }
    }

    pub fn is_walkable(&self) -> bool {
        self.walkable < BLOCKING_CLASS
    }

    /// Decode a CSV cell code: the first hex digit is the walkable class,
    /// the remaining digits are the height (`4A` is class 4, height 10).
    pub fn decode(code: &str) -> Option<Self> {
        let digits = strip_hex_prefix(code.trim());
        if digits.len() < 2 || digits.len() > 5 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        let height_bits = 4 * (digits.len() as u32 - 1);
        let walkable = (value >> height_bits) & 0xF;
        let height = value & ((1 << height_bits) - 1);
        Some(Self::new(u16::try_from(height).ok()?, walkable as u8))
    }

    /// Decode a packed `0xWHHH` code as a 16-bit value: top nibble is the
    /// walkable class, low 12 bits the height. Leading zeros are optional.
    pub fn decode_packed(code: &str) -> Option<Self> {
        let digits = strip_hex_prefix(code.trim());
        if digits.is_empty() {
            return None;
        }
        let value = u16::from_str_radix(digits, 16).ok()?;
        Some(Self::new(value & 0xFFF, (value >> 12) as u8))
    }
}

fn strip_hex_prefix(code: &str) -> &str {
    code.strip_prefix("0x")
        .or_else(|| code.strip_prefix("0X"))
        .unwrap_or(code)
}

// ---------------------------------------------------------------------------
// Heightmap
// ---------------------------------------------------------------------------

/// Rectangular grid of terrain cells, replaced wholesale on room change.
#[derive(Debug, Clone, Default)]
pub struct Heightmap {
    pub left_offset: i32,
    pub top_offset: i32,
    rows: Vec<Vec<HeightmapCell>>,
}

impl Heightmap {
    /// Build from already-decoded rows. Rows must be non-empty and of equal length.
    pub fn from_rows(
        left_offset: i32,
        top_offset: i32,
        rows: Vec<Vec<HeightmapCell>>,
    ) -> Result<Self, HeightmapError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(HeightmapError::Empty);
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(HeightmapError::InconsistentRow {
                row,
                expected,
                found: r.len(),
            });
        }
        Ok(Self {
            left_offset,
            top_offset,
            rows,
        })
    }

    /// Parse the standalone CSV resource: a header `left,top` in hex followed
    /// by rows of comma-separated cell codes.
    pub fn parse_csv(source: &str) -> Result<Self, HeightmapError> {
        let mut lines = source.lines().filter(|l| !l.trim().is_empty());
        let header = lines.next().ok_or(HeightmapError::Empty)?;
        let (left, top) = parse_header(header)?;
        let rows = parse_rows(lines, HeightmapCell::decode)?;
        Self::from_rows(left, top, rows)
    }

    /// Parse the packed in-map format (`0xWHHH` per cell); offsets come from
    /// the room record.
    pub fn parse_packed(
        source: &str,
        left_offset: i32,
        top_offset: i32,
    ) -> Result<Self, HeightmapError> {
        let rows = parse_rows(source.lines(), HeightmapCell::decode_packed)?;
        Self::from_rows(left_offset, top_offset, rows)
    }

    pub fn get_cell(&self, x: i32, y: i32) -> Option<&HeightmapCell> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.rows.get(y)?.get(x)
    }

    pub fn is_walkable(cell: &HeightmapCell) -> bool {
        cell.is_walkable()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

impl TerrainSource for Heightmap {
    fn cell(&self, x: i32, y: i32) -> Option<HeightmapCell> {
        self.get_cell(x, y).copied()
    }

    fn width(&self) -> usize {
        Heightmap::width(self)
    }

    fn height(&self) -> usize {
        Heightmap::height(self)
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_header(line: &str) -> Result<(i32, i32), HeightmapError> {
    let mut fields = line.split(',').map(str::trim).filter(|f| !f.is_empty());
    let mut next = || {
        fields
            .next()
            .and_then(parse_signed_hex)
            .ok_or_else(|| HeightmapError::MalformedHeader(line.to_string()))
    };
    let left = next()?;
    let top = next()?;
    Ok((left, top))
}

fn parse_signed_hex(field: &str) -> Option<i32> {
    let (negative, digits) = match field.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, field),
    };
    let digits = digits.trim_start_matches("0x").trim_start_matches("0X");
    let value = i32::from_str_radix(digits, 16).ok()?;
    Some(if negative { -value } else { value })
}

fn parse_rows<'a>(
    lines: impl Iterator<Item = &'a str>,
    decode: fn(&str) -> Option<HeightmapCell>,
) -> Result<Vec<Vec<HeightmapCell>>, HeightmapError> {
    let mut rows = Vec::new();
    for line in lines {
        let line = line.trim().trim_end_matches(',');
        if line.is_empty() {
            continue;
        }
        let row_idx = rows.len();
        let row = line
            .split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .enumerate()
            .map(|(col, code)| {
                decode(code).ok_or_else(|| HeightmapError::MalformedCode {
                    row: row_idx,
                    col,
                    code: code.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}
