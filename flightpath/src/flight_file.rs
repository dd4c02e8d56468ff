//! Flight-path text files.
//!
//! A flight file is what a viewer reads to replay a camera path. It starts
//! with one comment line naming the simulation box, followed by one row per
//! frame with 14 space-separated columns:
//!
//! ```text
//! # RefL0025N0376
//! frame a x y z  xx xy xz  yx yy yz  zx zy zz
//! ```
//!
//! `frame` is an integer. Every other column is written with 5 decimal
//! places. The nine basis columns are the x, y and z camera axes, in that
//! order, each as world-space components.
//!
//! The header is the rest of the first comment line after `# `, kept
//! exactly, so it cannot contain a line break. Reading is all or nothing:
//! the first malformed row fails the load with its line number.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use nalgebra::Vector3;
use thiserror::Error;

use crate::camera::{CameraBasis, DenseTrajectory, TrajectoryRecord};

/// Columns per data row.
pub const FLIGHT_FILE_COLUMNS: usize = 14;

/// Header used when none is given: the 25 Mpc reference box.
pub const DEFAULT_SIMULATION_LABEL: &str = "RefL0025N0376";

#[derive(Error, Debug)]
pub enum FlightFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Flight file line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("Header {0:?} contains a line break")]
    InvalidHeader(String),
}

/// A camera trajectory together with the label of the box it flies through.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightFile {
    pub header: String,
    pub trajectory: DenseTrajectory,
}

impl FlightFile {
    pub fn new(header: impl Into<String>, trajectory: DenseTrajectory) -> Self {
        Self {
            header: header.into(),
            trajectory,
        }
    }

    fn check_header(&self) -> Result<(), FlightFileError> {
        if self.header.contains(['\n', '\r']) {
            return Err(FlightFileError::InvalidHeader(self.header.clone()));
        }
        Ok(())
    }

    /// Write the header comment and one row per frame.
    ///
    /// Fails before writing anything if the header holds a line break.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), FlightFileError> {
        self.check_header()?;
        writeln!(writer, "# {}", self.header)?;
        for record in &self.trajectory {
            let p = &record.position;
            let b = &record.basis;
            writeln!(
                writer,
                "{} {:.5} {:.5} {:.5} {:.5} {:.5} {:.5} {:.5} {:.5} {:.5} {:.5} {:.5} {:.5} {:.5}",
                record.frame,
                record.scale_factor,
                p.x,
                p.y,
                p.z,
                b.x.x,
                b.x.y,
                b.x.z,
                b.y.x,
                b.y.y,
                b.y.z,
                b.z.x,
                b.z.y,
                b.z.z,
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Parse a flight file. A missing header comment leaves `header` empty.
    pub fn read_from<R: BufRead>(reader: R) -> Result<Self, FlightFileError> {
        let mut header = None;
        let mut records = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if let Some(comment) = line.trim_start().strip_prefix('#') {
                if header.is_none() && records.is_empty() {
                    let label = comment.strip_prefix(' ').unwrap_or(comment);
                    header = Some(label.to_string());
                }
                continue;
            }
            if trimmed.is_empty() {
                continue;
            }
            records.push(parse_row(trimmed, idx + 1)?);
        }

        Ok(Self {
            header: header.unwrap_or_default(),
            trajectory: DenseTrajectory::new(records),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), FlightFileError> {
        self.check_header()?;
        self.write_to(BufWriter::new(File::create(path)?))?;
        debug!(
            "Wrote {} frames to {}",
            self.trajectory.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, FlightFileError> {
        let flight = Self::read_from(BufReader::new(File::open(path)?))?;
        debug!(
            "Read {} frames from {}",
            flight.trajectory.len(),
            path.display()
        );
        Ok(flight)
    }
}

fn parse_row(row: &str, line: usize) -> Result<TrajectoryRecord, FlightFileError> {
    let fields: Vec<&str> = row.split_whitespace().collect();
    if fields.len() != FLIGHT_FILE_COLUMNS {
        return Err(FlightFileError::Format {
            line,
            reason: format!(
                "expected {FLIGHT_FILE_COLUMNS} columns, found {}",
                fields.len()
            ),
        });
    }

    let frame = fields[0]
        .parse::<i64>()
        .map_err(|_| FlightFileError::Format {
            line,
            reason: format!("frame '{}' is not an integer", fields[0]),
        })?;

    let mut values = [0.0; FLIGHT_FILE_COLUMNS - 1];
    for (value, field) in values.iter_mut().zip(&fields[1..]) {
        *value = field.parse::<f64>().map_err(|_| FlightFileError::Format {
            line,
            reason: format!("'{field}' is not a number"),
        })?;
    }

    let vector = |start: usize| Vector3::new(values[start], values[start + 1], values[start + 2]);

    // Bases are taken as written; rounding to 5 places is not corrected
    Ok(TrajectoryRecord {
        frame,
        scale_factor: values[0],
        position: vector(1),
        basis: CameraBasis {
            x: vector(4),
            y: vector(7),
            z: vector(10),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Cursor;

    fn synthetic(frames: i64) -> DenseTrajectory {
        let records = (0..frames)
            .map(|frame| {
                let angle = 0.3 * frame as f64;
                let basis = CameraBasis::from_look(
                    &Vector3::new(angle.cos(), angle.sin(), 0.2),
                    &Vector3::z(),
                )
                .unwrap();
                TrajectoryRecord {
                    frame: frame + 10,
                    scale_factor: 0.5 + 0.0123456 * frame as f64,
                    position: Vector3::new(1.234567 * frame as f64, -2.5, 12.000004),
                    basis,
                }
            })
            .collect();
        DenseTrajectory::new(records)
    }

    fn round_trip(flight: &FlightFile) -> FlightFile {
        let mut buffer = Vec::new();
        flight.write_to(&mut buffer).unwrap();
        FlightFile::read_from(Cursor::new(buffer)).unwrap()
    }

    #[test]
    fn test_round_trip_to_five_decimals() {
        let flight = FlightFile::new(DEFAULT_SIMULATION_LABEL, synthetic(5));
        let read = round_trip(&flight);

        assert_eq!(read.header, DEFAULT_SIMULATION_LABEL);
        assert_eq!(read.trajectory.len(), 5);
        for (a, b) in flight.trajectory.iter().zip(read.trajectory.iter()) {
            assert_eq!(a.frame, b.frame);
            assert_relative_eq!(a.scale_factor, b.scale_factor, epsilon = 5e-6);
            assert_relative_eq!(a.position, b.position, epsilon = 5e-6);
            assert_relative_eq!(a.basis.x, b.basis.x, epsilon = 5e-6);
            assert_relative_eq!(a.basis.y, b.basis.y, epsilon = 5e-6);
            assert_relative_eq!(a.basis.z, b.basis.z, epsilon = 5e-6);
        }

        // A second pass is lossless
        assert_eq!(round_trip(&read), read);
    }

    #[test]
    fn test_row_layout() {
        let flight = FlightFile::new("box", synthetic(1));
        let mut buffer = Vec::new();
        flight.write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "# box");
        let basis = flight.trajectory.records()[0].basis;
        let expected = format!(
            "10 0.50000 0.00000 -2.50000 12.00000 {:.5} {:.5} {:.5}",
            basis.x.x, basis.x.y, basis.x.z
        );
        assert!(lines[1].starts_with(&expected), "{}", lines[1]);
        assert_eq!(lines[1].split(' ').count(), FLIGHT_FILE_COLUMNS);
    }

    #[test]
    fn test_zero_rows() {
        let flight = FlightFile::new(DEFAULT_SIMULATION_LABEL, DenseTrajectory::default());
        let read = round_trip(&flight);
        assert_eq!(read, flight);
    }

    #[test]
    fn test_wrong_column_count_names_line() {
        let text = "# box\n\
                    0 0.5 0 0 0 1 0 0 0 1 0 0 0 1\n\
                    1 0.5 0 0 0 1 0 0 0 1 0 0 0\n";
        match FlightFile::read_from(Cursor::new(text)) {
            Err(FlightFileError::Format { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_field() {
        let text = "# box\n0 0.5 0 0 0 1 0 0 0 1 0 0 0 one\n";
        assert!(matches!(
            FlightFile::read_from(Cursor::new(text)),
            Err(FlightFileError::Format { line: 2, .. })
        ));

        let fractional_frame = "# box\n0.5 0.5 0 0 0 1 0 0 0 1 0 0 0 1\n";
        assert!(matches!(
            FlightFile::read_from(Cursor::new(fractional_frame)),
            Err(FlightFileError::Format { line: 2, .. })
        ));
    }

    #[test]
    fn test_header_kept_exactly() {
        let flight = FlightFile::new("  Ref L0025 N0376 ", synthetic(2));
        let read = round_trip(&flight);
        assert_eq!(read.header, "  Ref L0025 N0376 ");
        assert_eq!(read.trajectory.len(), 2);

        let bare = "#box\n0 0.5 0 0 0 1 0 0 0 1 0 0 0 1\n";
        assert_eq!(FlightFile::read_from(Cursor::new(bare)).unwrap().header, "box");
    }

    #[test]
    fn test_header_line_break_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.txt");

        for header in ["RefL0025N0376\n0 0.5 0 0 0 1 0 0 0 1 0 0 0 1", "box\r"] {
            let flight = FlightFile::new(header, synthetic(1));

            let mut buffer = Vec::new();
            assert!(matches!(
                flight.write_to(&mut buffer),
                Err(FlightFileError::InvalidHeader(_))
            ));
            assert!(buffer.is_empty());

            assert!(matches!(
                flight.save(&path),
                Err(FlightFileError::InvalidHeader(_))
            ));
            assert!(!path.exists());
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flight.txt");

        let flight = FlightFile::new("RefL0100N1504", synthetic(3));
        flight.save(&path).unwrap();
        let loaded = FlightFile::load(&path).unwrap();

        assert_eq!(loaded.header, "RefL0100N1504");
        assert_eq!(loaded.trajectory.len(), 3);
    }
}
