use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::model::{name_from_path, Spectrum};
use crate::error::{IdentifyError, Result};

/// Header names that identify the intensity column. A column literally named
/// `raw` never matches.
static INTENSITY_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"processed|spectrum|spectra|intensity").unwrap());

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// What the reader recovered from one delimited text source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTable {
    pub wavenumbers: Vec<f64>,
    pub intensities: Vec<f64>,
    /// Value of the `Label` metadata row, if one was present and non-empty.
    pub label: Option<String>,
}

/// Load a spectrum from a comma-delimited instrument export.
///
/// The spectrum is named after the `Label` metadata row when there is one,
/// otherwise after the file stem.
pub fn load_spectrum(path: &Path) -> Result<Spectrum> {
    let io_error = |source| IdentifyError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    let table = read_table(BufReader::new(file)).map_err(io_error)?;

    let name = table.label.unwrap_or_else(|| name_from_path(path));
    let spectrum = Spectrum::new(name, table.wavenumbers, table.intensities)?.with_source(path);
    debug!(
        "loaded {} ({} pixels) from {}",
        spectrum.name(),
        spectrum.pixel_count(),
        path.display()
    );
    Ok(spectrum)
}

/// Run the reader state machine over `reader`.
///
/// Malformed or short rows are skipped; only I/O failures are errors.
pub fn read_table<R: BufRead>(mut reader: R) -> std::io::Result<ParsedTable> {
    let mut parser = TableParser::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        parser.feed(&String::from_utf8_lossy(&buf));
    }
    Ok(parser.table)
}

/// Write `spectrum` in the layout [`read_table`] understands best: a `Label`
/// metadata row, a blank separator, a header, then one row per sample.
///
/// The reader splits on bare commas and trims fields, so a name that could
/// not be read back unchanged is refused with [`io::ErrorKind::InvalidInput`].
pub fn write_spectrum<W: Write>(mut writer: W, spectrum: &Spectrum) -> csv::Result<()> {
    let name = spectrum.name();
    if !is_writable_label(name) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("spectrum name {name:?} cannot be stored as a Label row"),
        )
        .into());
    }
    // the label row goes out unquoted: the reader does not unquote
    writeln!(writer, "Label,{name}")?;
    writeln!(writer)?;

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["Wavenumber", "Processed"])?;
    for (wavenumber, intensity) in spectrum.wavenumbers().iter().zip(spectrum.intensities()) {
        csv.write_record([wavenumber.to_string(), intensity.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}

fn is_writable_label(name: &str) -> bool {
    !name.is_empty()
        && name.trim() == name
        && !name.contains([',', '\n', '\r'])
}

// ---------------------------------------------------------------------------
// Line state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    ReadingMetadata,
    ReadingHeader,
    ReadingData,
}

#[derive(Debug)]
struct TableParser {
    state: State,
    wavenumber_column: usize,
    intensity_column: usize,
    table: ParsedTable,
}

impl Default for TableParser {
    fn default() -> Self {
        // until a header says otherwise
        Self {
            state: State::default(),
            wavenumber_column: 0,
            intensity_column: 1,
            table: ParsedTable::default(),
        }
    }
}

impl TableParser {
    fn feed(&mut self, raw: &str) {
        let mut line = raw.trim();
        // "CSV blanks": rows of nothing but commas
        if line.bytes().all(|b| b == b',') {
            line = "";
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        match self.state {
            State::ReadingMetadata => {
                if starts_numeric(line) {
                    // no metadata and no header: keep the default columns
                    self.state = State::ReadingData;
                    self.read_values(&fields);
                } else if line.is_empty() {
                    self.state = State::ReadingHeader;
                } else if let [key, value, ..] = fields.as_slice() {
                    if key.eq_ignore_ascii_case("label") && !value.is_empty() {
                        self.table.label = Some(value.to_string());
                    }
                }
            }
            State::ReadingHeader => {
                if line.is_empty() {
                    return;
                }
                if starts_numeric(line) {
                    self.read_values(&fields);
                } else {
                    self.read_header(&fields);
                }
                self.state = State::ReadingData;
            }
            State::ReadingData => self.read_values(&fields),
        }
    }

    fn read_header(&mut self, fields: &[&str]) {
        for (i, field) in fields.iter().enumerate() {
            let name = field.to_lowercase();
            if name == "wavenumber" {
                self.wavenumber_column = i;
            } else if name != "raw" && INTENSITY_COLUMN.is_match(&name) {
                self.intensity_column = i;
            }
        }
    }

    fn read_values(&mut self, fields: &[&str]) {
        let (Some(wavenumber), Some(intensity)) = (
            fields.get(self.wavenumber_column),
            fields.get(self.intensity_column),
        ) else {
            return;
        };
        if let (Ok(wavenumber), Ok(intensity)) = (wavenumber.parse::<f64>(), intensity.parse::<f64>()) {
            self.table.wavenumbers.push(wavenumber);
            self.table.intensities.push(intensity);
        }
    }
}

fn starts_numeric(line: &str) -> bool {
    matches!(line.as_bytes().first(), Some(b'0'..=b'9' | b'-'))
}
