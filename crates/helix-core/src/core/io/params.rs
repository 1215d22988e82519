use crate::core::io::traits::RecordFile;
use crate::core::models::lattice::{LatticeError, LatticeModel};
use crate::core::models::strand::Strand;
use crate::core::utils::geometry::{RealSpaceBasis, RealSpaceVector};
use nalgebra::{Point2, Vector2};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::warn;

const KEY_WIDTH: usize = 20;
const VALUE_WIDTH: usize = 12;
const PRECISION: usize = 6;

const KEY_PIXEL_SIZE: &str = "Angpix";
const KEY_ORIGIN_X: &str = "Origin X";
const KEY_ORIGIN_Y: &str = "Origin Y";
const KEY_SPACING: &str = "Layerline distance";
const KEY_X1: &str = "X_coord 1";
const KEY_Y1: &str = "Y_coord 1";
const KEY_ORDER1: &str = "Bessel order 1";
const KEY_X2: &str = "X_coord 2";
const KEY_Y2: &str = "Y_coord 2";
const KEY_ORDER2: &str = "Bessel order 2";
const KEY_RS_LENGTH: &str = "RS length";
const KEY_RS_ANGLE: &str = "RS angle";
const KEY_RADIUS: &str = "Helix radius";
const KEY_RISE: &str = "Rise/subunit";
const KEY_TWIST: &str = "Twist/subunit";
const KEY_N_START: &str = "n-start";
const SECTION_VECTOR_1: &str = "Base vector 1";
const SECTION_VECTOR_2: &str = "Base vector 2";

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: ParamsParseErrorKind,
    },
    #[error("Missing required parameter '{0}'")]
    MissingKey(&'static str),
    #[error("Parameters describe an invalid lattice: {0}")]
    Lattice(#[from] LatticeError),
}

#[derive(Debug, Error)]
pub enum ParamsParseErrorKind {
    #[error("Line has no 'key: value' separator")]
    MissingSeparator,
    #[error("Invalid number for '{key}' (value: '{value}')")]
    InvalidFloat { key: String, value: String },
    #[error("Invalid integer for '{key}' (value: '{value}')")]
    InvalidInt { key: String, value: String },
    #[error("Parameter '{0}' appears more than once")]
    DuplicateKey(String),
}

/// Everything persisted about one indexed spectrum.
///
/// Real-space vectors and the symmetry are derived quantities: they are written for the
/// reader's benefit and read back when present, but the lattice is fully described by the
/// reciprocal values alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRecord {
    pub pixel_size: f64,
    pub origin: Point2<f64>,
    pub layerline_spacing: f64,
    pub base_vectors: [Vector2<f64>; 2],
    pub bessel_orders: (i32, i32),
    pub real_space: Option<RealSpaceBasis>,
    pub helix_radius: f64,
    pub symmetry: Option<Strand>,
}

impl ParameterRecord {
    pub fn from_model(model: &LatticeModel, pixel_size: f64, helix_radius: f64) -> Self {
        let (v1, v2) = model.base_vectors();
        Self {
            pixel_size,
            origin: model.origin(),
            layerline_spacing: model.layerline_spacing(),
            base_vectors: [v1, v2],
            bessel_orders: model.bessel_orders(),
            real_space: None,
            helix_radius,
            symmetry: None,
        }
    }

    pub fn with_real_space(mut self, basis: RealSpaceBasis) -> Self {
        self.real_space = Some(basis);
        self
    }

    pub fn with_symmetry(mut self, strand: Strand) -> Self {
        self.symmetry = Some(strand);
        self
    }

    /// Rebuilds the lattice model described by this record.
    pub fn to_model(&self) -> Result<LatticeModel, LatticeError> {
        LatticeModel::from_parts(
            self.origin,
            self.layerline_spacing,
            self.base_vectors[0],
            self.base_vectors[1],
            self.bessel_orders,
        )
    }
}

/// The `key: value` parameter text file.
///
/// Each line holds a key left-justified to 20 columns, including its colon, followed by a
/// right-aligned number. Vector blocks are introduced by a `Base vector N:` header line, which
/// scopes the `RS length`/`RS angle` entries that follow it. Files written with fewer decimals
/// are read the same way.
pub struct ParamsFile;

impl ParamsFile {
    fn write_float(writer: &mut impl Write, key: &str, value: f64) -> io::Result<()> {
        writeln!(
            writer,
            "{:<KEY_WIDTH$}{:>VALUE_WIDTH$.PRECISION$}",
            format!("{key}:"),
            value
        )
    }

    fn write_int(writer: &mut impl Write, key: &str, value: i64) -> io::Result<()> {
        writeln!(
            writer,
            "{:<KEY_WIDTH$}{:>VALUE_WIDTH$}",
            format!("{key}:"),
            value
        )
    }

    fn write_vector(
        writer: &mut impl Write,
        header: &str,
        keys: (&str, &str, &str),
        vector: &Vector2<f64>,
        order: i32,
        real_space: Option<&RealSpaceVector>,
    ) -> io::Result<()> {
        writeln!(writer, "{header}:")?;
        Self::write_float(writer, keys.0, vector.x)?;
        Self::write_float(writer, keys.1, vector.y)?;
        Self::write_int(writer, keys.2, order as i64)?;
        if let Some(rs) = real_space {
            Self::write_float(writer, KEY_RS_LENGTH, rs.length)?;
            Self::write_float(writer, KEY_RS_ANGLE, rs.angle)?;
        }
        writeln!(writer)
    }
}

/// Raw values keyed by parameter name, with the line each came from.
type Entries = HashMap<String, (usize, String)>;

#[derive(Default)]
struct RawEntries {
    global: Entries,
    vector: [Entries; 2],
}

impl RawEntries {
    fn collect(reader: &mut impl BufRead) -> Result<Self, ParamsError> {
        let mut entries = Self::default();
        let mut section: Option<usize> = None;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Some((key, value)) = trimmed.split_once(':') else {
                return Err(ParamsError::Parse {
                    line: line_num,
                    kind: ParamsParseErrorKind::MissingSeparator,
                });
            };
            let (key, value) = (key.trim(), value.trim());

            if value.is_empty() {
                section = match key {
                    SECTION_VECTOR_1 => Some(0),
                    SECTION_VECTOR_2 => Some(1),
                    other => {
                        warn!(line = line_num, key = other, "Ignoring parameter without value");
                        section
                    }
                };
                continue;
            }

            let scoped = matches!(key, KEY_RS_LENGTH | KEY_RS_ANGLE);
            let target = match (scoped, section) {
                (true, Some(idx)) => &mut entries.vector[idx],
                _ => &mut entries.global,
            };
            if target
                .insert(key.to_string(), (line_num, value.to_string()))
                .is_some()
            {
                return Err(ParamsError::Parse {
                    line: line_num,
                    kind: ParamsParseErrorKind::DuplicateKey(key.to_string()),
                });
            }
        }
        Ok(entries)
    }
}

fn parse_float(
    map: &Entries,
    key: &'static str,
) -> Result<Option<f64>, ParamsError> {
    map.get(key)
        .map(|(line, value)| {
            value.parse::<f64>().map_err(|_| ParamsError::Parse {
                line: *line,
                kind: ParamsParseErrorKind::InvalidFloat {
                    key: key.to_string(),
                    value: value.clone(),
                },
            })
        })
        .transpose()
}

fn parse_int(
    map: &Entries,
    key: &'static str,
) -> Result<Option<i64>, ParamsError> {
    map.get(key)
        .map(|(line, value)| {
            let invalid = || ParamsError::Parse {
                line: *line,
                kind: ParamsParseErrorKind::InvalidInt {
                    key: key.to_string(),
                    value: value.clone(),
                },
            };
            match value.parse::<i64>() {
                Ok(v) => Ok(v),
                Err(_) => match value.parse::<f64>() {
                    Ok(f) if f.fract() == 0.0 && f.abs() < i32::MAX as f64 => Ok(f as i64),
                    _ => Err(invalid()),
                },
            }
        })
        .transpose()
}

fn require_float(
    map: &Entries,
    key: &'static str,
) -> Result<f64, ParamsError> {
    parse_float(map, key)?.ok_or(ParamsError::MissingKey(key))
}

fn require_order(
    map: &Entries,
    key: &'static str,
) -> Result<i32, ParamsError> {
    let value = parse_int(map, key)?.ok_or(ParamsError::MissingKey(key))?;
    i32::try_from(value).map_err(|_| ParamsError::Parse {
        line: map.get(key).map_or(0, |(line, _)| *line),
        kind: ParamsParseErrorKind::InvalidInt {
            key: key.to_string(),
            value: value.to_string(),
        },
    })
}

fn real_space_vector(
    map: &Entries,
) -> Result<Option<RealSpaceVector>, ParamsError> {
    let length = parse_float(map, KEY_RS_LENGTH)?;
    let angle = parse_float(map, KEY_RS_ANGLE)?;
    Ok(length
        .zip(angle)
        .map(|(length, angle)| RealSpaceVector { length, angle }))
}

impl RecordFile for ParamsFile {
    type Record = ParameterRecord;
    type Error = ParamsError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Record, Self::Error> {
        let entries = RawEntries::collect(reader)?;
        let g = &entries.global;

        let real_space = match (
            real_space_vector(&entries.vector[0])?,
            real_space_vector(&entries.vector[1])?,
        ) {
            (Some(first), Some(second)) => Some(RealSpaceBasis { first, second }),
            _ => None,
        };

        let rise = parse_float(g, KEY_RISE)?;
        let twist = parse_float(g, KEY_TWIST)?;
        let n_start = parse_int(g, KEY_N_START)?;
        let symmetry = match (rise, twist, n_start) {
            (Some(rise), Some(twist), Some(n)) => Some(Strand {
                rise,
                twist,
                n_start: u32::try_from(n).unwrap_or(0),
            }),
            _ => None,
        };

        Ok(ParameterRecord {
            pixel_size: require_float(g, KEY_PIXEL_SIZE)?,
            origin: Point2::new(
                require_float(g, KEY_ORIGIN_X)?,
                require_float(g, KEY_ORIGIN_Y)?,
            ),
            layerline_spacing: require_float(g, KEY_SPACING)?,
            base_vectors: [
                Vector2::new(require_float(g, KEY_X1)?, require_float(g, KEY_Y1)?),
                Vector2::new(require_float(g, KEY_X2)?, require_float(g, KEY_Y2)?),
            ],
            bessel_orders: (require_order(g, KEY_ORDER1)?, require_order(g, KEY_ORDER2)?),
            real_space,
            helix_radius: parse_float(g, KEY_RADIUS)?.unwrap_or(0.0),
            symmetry,
        })
    }

    fn write_to(record: &Self::Record, writer: &mut impl Write) -> Result<(), Self::Error> {
        Self::write_float(writer, KEY_PIXEL_SIZE, record.pixel_size)?;
        writeln!(writer)?;
        Self::write_float(writer, KEY_ORIGIN_X, record.origin.x)?;
        Self::write_float(writer, KEY_ORIGIN_Y, record.origin.y)?;
        writeln!(writer)?;
        Self::write_float(writer, KEY_SPACING, record.layerline_spacing)?;
        writeln!(writer)?;

        Self::write_vector(
            writer,
            SECTION_VECTOR_1,
            (KEY_X1, KEY_Y1, KEY_ORDER1),
            &record.base_vectors[0],
            record.bessel_orders.0,
            record.real_space.as_ref().map(|b| &b.first),
        )?;
        Self::write_vector(
            writer,
            SECTION_VECTOR_2,
            (KEY_X2, KEY_Y2, KEY_ORDER2),
            &record.base_vectors[1],
            record.bessel_orders.1,
            record.real_space.as_ref().map(|b| &b.second),
        )?;

        Self::write_float(writer, KEY_RADIUS, record.helix_radius)?;
        if let Some(strand) = &record.symmetry {
            Self::write_float(writer, KEY_RISE, strand.rise)?;
            Self::write_float(writer, KEY_TWIST, strand.twist)?;
            Self::write_int(writer, KEY_N_START, strand.n_start as i64)?;
        }
        Ok(())
    }
}
