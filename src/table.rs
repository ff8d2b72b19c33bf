use crate::error::{Result, StitchError};
use crate::sweep::ResultMatrix;
use serde::Serialize;
use std::io::Write;

/// The sweep result as a plain numeric table.
///
/// Row 0 is `[0, overlaps..]`, then one `[threshold, 0/1..]` row per threshold,
/// then a summary row: its first cell is 1 when no threshold is 0, and each
/// overlap column is 1 when that overlap passed at every threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub rows: Vec<Vec<f64>>,
}

fn as_num(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

impl ResultTable {
    pub fn build(thresholds: &[f64], overlaps: &[usize], cells: &[Vec<bool>]) -> Result<Self> {
        let dims = (cells.len(), cells.first().map_or(overlaps.len(), Vec::len), 1);
        if cells.len() != thresholds.len() || cells.iter().any(|row| row.len() != overlaps.len()) {
            return Err(StitchError::shape_mismatch(
                "result matrix",
                (thresholds.len(), overlaps.len(), 1),
                dims,
            ));
        }

        let mut rows = Vec::with_capacity(thresholds.len() + 2);

        let mut header = vec![0.0];
        header.extend(overlaps.iter().map(|&w| w as f64));
        rows.push(header);

        for (&t, cell_row) in thresholds.iter().zip(cells) {
            let mut row = vec![t];
            row.extend(cell_row.iter().map(|&c| as_num(c)));
            rows.push(row);
        }

        let mut summary = vec![as_num(thresholds.iter().all(|&t| t != 0.0))];
        summary.extend((0..overlaps.len()).map(|j| as_num(cells.iter().all(|row| row[j]))));
        rows.push(summary);

        Ok(Self { rows })
    }

    pub fn from_matrix(m: &ResultMatrix) -> Result<Self> {
        Self::build(&m.thresholds, &m.overlaps, &m.cells)
    }

    /// Tab-separated, one row per line.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            out.push_str(&line.join("\t"));
            out.push('\n');
        }
        out
    }

    pub fn write_tsv<W: Write>(&self, mut out: W) -> std::io::Result<()> {
        out.write_all(self.to_tsv().as_bytes())?;
        out.flush()
    }
}
