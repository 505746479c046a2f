//! Plain (ASCII) Portable Bitmap output.
//!
//! Live cells are written as `0` (white) and dead cells as `1` (black). The
//! image puts `(0, 0)` in the bottom-left corner: rows run from y = L-1 down to
//! y = 0, and x increases left to right.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::lattice::Lattice;

/// Values per output line; keeps lines well under the 70-character limit.
pub const PIXELS_PER_LINE: usize = 32;

/// Write `lattice` as a plain PBM image.
pub fn write_pbm<W: Write>(out: &mut W, lattice: &Lattice) -> io::Result<()> {
    let length = lattice.length();
    writeln!(out, "P1")?;
    writeln!(out, "# Written by percolate")?;
    writeln!(out, "{length} {length}")?;

    let mut on_line = 0;
    for y in (0..length).rev() {
        for x in 0..length {
            let pixel = if lattice.is_alive(x, y) { '0' } else { '1' };
            if on_line > 0 {
                out.write_all(b" ")?;
            }
            write!(out, "{pixel}")?;
            on_line += 1;
            if on_line == PIXELS_PER_LINE {
                writeln!(out)?;
                on_line = 0;
            }
        }
    }
    if on_line != 0 {
        writeln!(out)?;
    }
    Ok(())
}

/// Write `lattice` to the file at `path`, replacing it if present.
pub fn write_pbm_file(path: impl AsRef<Path>, lattice: &Lattice) -> io::Result<()> {
    let path = path.as_ref();
    info!("writing {}x{} image to {}", lattice.length(), lattice.length(), path.display());
    let mut out = BufWriter::new(File::create(path)?);
    write_pbm(&mut out, lattice)?;
    out.flush()
}
