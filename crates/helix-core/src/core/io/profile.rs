use crate::core::io::traits::RecordFile;
use crate::core::models::profile::{LayerlineProfile, ProfileShapeError};
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Row {row} has no phase although earlier rows do (or vice versa)")]
    PartialPhase { row: usize },
    #[error("Invalid profile: {0}")]
    Shape(#[from] ProfileShapeError),
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    radial_index: i64,
    amplitude: f64,
    #[serde(default)]
    phase: Option<f64>,
}

/// Layerline profiles as CSV with a `radial_index,amplitude[,phase]` header.
///
/// The phase column is optional, but when present every row must carry a value.
pub struct ProfileCsv;

impl RecordFile for ProfileCsv {
    type Record = LayerlineProfile;
    type Error = ProfileError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Record, Self::Error> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut radial_index = Vec::new();
        let mut amplitude = Vec::new();
        let mut phase = Vec::new();
        let mut has_phase = None;

        for (row, result) in csv_reader.deserialize::<ProfileRow>().enumerate() {
            let record = result?;
            let row_has_phase = record.phase.is_some();
            if *has_phase.get_or_insert(row_has_phase) != row_has_phase {
                return Err(ProfileError::PartialPhase { row: row + 1 });
            }
            radial_index.push(record.radial_index);
            amplitude.push(record.amplitude);
            if let Some(p) = record.phase {
                phase.push(p);
            }
        }

        let phase = has_phase.unwrap_or(false).then_some(phase);
        Ok(LayerlineProfile::new(radial_index, amplitude, phase)?)
    }

    fn write_to(record: &Self::Record, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        match record.phase() {
            Some(phases) => {
                csv_writer.write_record(["radial_index", "amplitude", "phase"])?;
                for ((r, a), p) in record
                    .radial_index()
                    .iter()
                    .zip(record.amplitude())
                    .zip(phases)
                {
                    csv_writer.serialize((r, a, p))?;
                }
            }
            None => {
                csv_writer.write_record(["radial_index", "amplitude"])?;
                for (r, a) in record.radial_index().iter().zip(record.amplitude()) {
                    csv_writer.serialize((r, a))?;
                }
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_profile_without_phase() {
        let text = "radial_index,amplitude\n-1,0.5\n0,0.0\n1,2.25\n";
        let profile = ProfileCsv::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(profile.radial_index(), &[-1, 0, 1]);
        assert_eq!(profile.amplitude(), &[0.5, 0.0, 2.25]);
        assert!(profile.phase().is_none());
    }

    #[test]
    fn reads_profile_with_phase_and_padding() {
        let text = "radial_index, amplitude, phase\n-1, 1.0, 90\n0, 0.0, 0\n1, 1.0, -90\n";
        let profile = ProfileCsv::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(profile.phase(), Some(&[90.0, 0.0, -90.0][..]));
    }

    #[test]
    fn partial_phase_column_is_rejected() {
        let text = "radial_index,amplitude,phase\n0,1.0,10\n1,2.0,\n";
        let result = ProfileCsv::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(ProfileError::PartialPhase { row: 2 })));
    }

    #[test]
    fn empty_file_is_rejected() {
        let result = ProfileCsv::read_from(&mut Cursor::new("radial_index,amplitude\n"));
        assert!(matches!(
            result,
            Err(ProfileError::Shape(ProfileShapeError::Empty))
        ));
    }

    #[test]
    fn non_numeric_amplitude_is_a_csv_error() {
        let text = "radial_index,amplitude\n0,abc\n";
        let result = ProfileCsv::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(ProfileError::Csv(_))));
    }

    #[test]
    fn written_profile_reads_back() {
        let profile =
            LayerlineProfile::new(vec![-2, -1, 0], vec![3.5, 1.0, 0.0], Some(vec![10.0, 0.0, 5.0]))
                .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.csv");
        ProfileCsv::write_to_path(&profile, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("radial_index,amplitude,phase\n"));
        assert_eq!(ProfileCsv::read_from_path(&path).unwrap(), profile);
    }
}
