//! Routes each row of a PMTM file to the handler for its line type.
//!
//! Data starts two columns after the tag. Metadata lines hold their values
//! in consecutive columns; parameter, timer and overhead lines interleave
//! labels with values. `Specific` lines start one column earlier.

use crate::core::FormatError;
use crate::format::rank::{RankId, SymbolicRank};
use crate::format::version::FormatVersion;
use crate::model::{
    Application, Compiler, Machine, Mpi, Os, Overhead, ParamValue, Parameter, PmtmRecord,
    Processor, Timer,
};
use chrono::{NaiveDate, NaiveTime, Timelike};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

const DATE_FORMAT: &str = "%d-%m-%Y";
const TIME_FORMAT: &str = "%H:%M";

lazy_static! {
    static ref CLOCK_SPEED: Regex = Regex::new(r"(?i)^(\d+)(\.\d+)?\s*(GHz|MHz)?$").unwrap();
}

/// Every line type a PMTM file may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    PmtmVersion,
    Application,
    RunId,
    NProcs,
    MaxOpenmpThreads,
    Machine,
    Processor,
    Os,
    Compiler,
    Mpi,
    Tag,
    Flags,
    Date,
    Time,
    Overhead,
    Parameter,
    Timer,
    Environ,
    Specific,
}

impl LineKind {
    /// Look up a line tag. Tags are case-insensitive and spaces count as
    /// underscores; `System` is an older spelling of `OS`.
    pub fn from_tag(tag: &str) -> Result<Self, FormatError> {
        let normalized = tag.trim().to_lowercase().replace(' ', "_");
        let kind = match normalized.as_str() {
            "#type" => Self::Header,
            "pmtm_version" => Self::PmtmVersion,
            "application" => Self::Application,
            "run_id" => Self::RunId,
            "nprocs" => Self::NProcs,
            "max_openmp_threads" => Self::MaxOpenmpThreads,
            "machine" => Self::Machine,
            "processor" => Self::Processor,
            "os" | "system" => Self::Os,
            "compiler" => Self::Compiler,
            "mpi" => Self::Mpi,
            "tag" => Self::Tag,
            "flags" => Self::Flags,
            "date" => Self::Date,
            "time" => Self::Time,
            "overhead" => Self::Overhead,
            "parameter" => Self::Parameter,
            "timer" => Self::Timer,
            "environ" => Self::Environ,
            "specific" => Self::Specific,
            _ => return Err(FormatError::UnknownLineType(tag.trim().to_string())),
        };
        Ok(kind)
    }

    /// Index of the first data column in the raw row.
    pub fn first_column(&self) -> usize {
        match self {
            Self::Specific => 1,
            _ => 2,
        }
    }
}

/// Accumulates the contents of a file as its rows are dispatched.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    version: Option<FormatVersion>,
    application: Option<Application>,
    machine: Option<Machine>,
    os: Option<Os>,
    processor: Option<Processor>,
    compiler: Option<Compiler>,
    mpi: Option<Mpi>,
    run_id: Option<String>,
    nprocs: Option<String>,
    max_openmp_threads: Option<String>,
    tag: Option<String>,
    flags: Vec<String>,
    timestamp: i64,
    environ: BTreeMap<String, String>,
    parameters: Vec<Parameter>,
    timers: Vec<Timer>,
    overheads: Vec<Overhead>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> Option<FormatVersion> {
        self.version
    }

    /// Dispatch one tokenized row.
    pub fn dispatch(&mut self, fields: &[String]) -> Result<(), FormatError> {
        let Some(tag) = fields.first().map(|f| f.trim()) else {
            return Ok(());
        };
        if tag.is_empty() {
            return Ok(());
        }

        let kind = LineKind::from_tag(tag)?;
        debug!("Reading line starting with {:?}", tag);

        if kind == LineKind::Header {
            return Ok(());
        }

        let cols: Vec<&str> = fields
            .iter()
            .skip(kind.first_column())
            .map(|f| f.trim())
            .collect();
        let line = Line { tag, cols: &cols };

        if kind == LineKind::PmtmVersion {
            self.version = Some(FormatVersion::parse(line.get(0)?)?);
            return Ok(());
        }
        let version = self.version.ok_or(FormatError::MissingVersion)?;

        match kind {
            LineKind::Header | LineKind::PmtmVersion => {}
            LineKind::Application => self.application = Some(parse_application(line.get(0)?)),
            LineKind::RunId => self.run_id = Some(line.get(0)?.to_string()),
            LineKind::NProcs => self.nprocs = Some(line.get(0)?.to_string()),
            LineKind::MaxOpenmpThreads => {
                self.max_openmp_threads = Some(line.get(0)?.to_string())
            }
            LineKind::Machine => self.machine = Some(parse_machine(&line, version)?),
            LineKind::Processor => {
                if version.has_broken_processor_line() {
                    debug!("Ignoring processor line written by PMTM {}", version);
                } else {
                    self.processor = Some(parse_processor(&line)?);
                }
            }
            LineKind::Os => {
                self.os = Some(Os {
                    vendor: line.get(0)?.to_string(),
                    name: line.get(1)?.to_string(),
                    version: line.get(2)?.to_string(),
                    kernel: line.get(3)?.to_string(),
                })
            }
            LineKind::Compiler => {
                self.compiler = Some(Compiler {
                    vendor: line.get(0)?.to_string(),
                    name: line.get(1)?.to_string(),
                    version: line.get(2)?.to_string(),
                })
            }
            LineKind::Mpi => {
                self.mpi = Some(Mpi {
                    vendor: line.get(0)?.to_string(),
                    name: line.get(1)?.to_string(),
                    version: line.get(2)?.to_string(),
                })
            }
            LineKind::Tag => self.tag = Some(line.get(0)?.to_string()),
            LineKind::Flags => self.flags = cols.iter().map(|c| c.to_string()).collect(),
            LineKind::Date => self.timestamp += parse_date(line.get(0)?)?,
            LineKind::Time => self.timestamp += parse_time(line.get(0)?)?,
            LineKind::Overhead => self.overheads.push(parse_overhead(&line, version)?),
            LineKind::Parameter => self.parameters.push(parse_parameter(&line, version)?),
            LineKind::Timer => self.timers.push(parse_timer(&line, version)?),
            LineKind::Environ => {
                let joined = cols.join(", ");
                let (name, value) = joined.split_once('=').unwrap_or((joined.as_str(), ""));
                self.environ.insert(name.to_string(), value.to_string());
            }
            LineKind::Specific => self.parameters.push(Parameter {
                rank: RankId::literal(0),
                name: line.get(0)?.to_string(),
                value: ParamValue::classify(line.get(2)?),
            }),
        }
        Ok(())
    }

    pub fn finish(self) -> Result<PmtmRecord, FormatError> {
        let version = self.version.ok_or(FormatError::MissingVersion)?;
        Ok(PmtmRecord {
            version,
            application: self.application,
            machine: self.machine,
            os: self.os,
            processor: self.processor,
            compiler: self.compiler,
            mpi: self.mpi,
            run_id: self.run_id,
            nprocs: self.nprocs,
            max_openmp_threads: self.max_openmp_threads,
            tag: self.tag,
            flags: self.flags,
            timestamp: self.timestamp,
            environ: self.environ,
            parameters: self.parameters,
            timers: self.timers,
            overheads: self.overheads,
        })
    }
}

/// The data columns of one row, with the tag kept for error messages.
struct Line<'a> {
    tag: &'a str,
    cols: &'a [&'a str],
}

impl<'a> Line<'a> {
    fn get(&self, index: usize) -> Result<&'a str, FormatError> {
        self.cols
            .get(index)
            .copied()
            .ok_or_else(|| FormatError::MissingField {
                line: self.tag.to_string(),
                index,
            })
    }

    /// Field `index` of the label/value interleaved columns.
    fn pair(&self, index: usize) -> Result<&'a str, FormatError> {
        self.get(index * 2)
    }
}

fn parse_application(text: &str) -> Application {
    let (name, version) = text.split_once(' ').unwrap_or((text, ""));
    Application {
        name: name.to_string(),
        version: version.to_string(),
    }
}

fn parse_machine(line: &Line<'_>, version: FormatVersion) -> Result<Machine, FormatError> {
    if version <= FormatVersion::V2_1_1 {
        Ok(Machine {
            vendor: None,
            name: line.get(0)?.to_string(),
        })
    } else {
        Ok(Machine {
            vendor: Some(line.get(0)?.to_string()),
            name: line.get(1)?.to_string(),
        })
    }
}

fn parse_processor(line: &Line<'_>) -> Result<Processor, FormatError> {
    Ok(Processor {
        vendor: line.get(0)?.to_string(),
        name: line.get(1)?.to_string(),
        arch: line.get(2)?.to_string(),
        clock: parse_clock(line.get(3)?)?,
        nprocs: parse_int(line.get(4)?)?,
        nthreads: parse_int(line.get(5)?)?,
    })
}

fn parse_overhead(line: &Line<'_>, version: FormatVersion) -> Result<Overhead, FormatError> {
    let mut error = parse_float(line.pair(3)?)?;
    if version < FormatVersion::V0_2_6 {
        // Written pre-multiplied by the overhead sample count.
        error /= Overhead::COUNT as f64;
    }
    Ok(Overhead {
        name: line.pair(1)?.to_string(),
        value: parse_float(line.pair(2)?)?,
        error,
    })
}

fn parse_parameter(line: &Line<'_>, version: FormatVersion) -> Result<Parameter, FormatError> {
    Ok(Parameter {
        rank: parse_rank(line.pair(0)?, version)?,
        name: line.pair(1)?.to_string(),
        value: ParamValue::classify(line.pair(2)?),
    })
}

/// Timer columns: rank, name, value and error as pairs, then an unlabelled
/// column, then count and pause as pairs.
fn parse_timer(line: &Line<'_>, version: FormatVersion) -> Result<Timer, FormatError> {
    let pause = if version < FormatVersion::V0_2_3 {
        0
    } else {
        parse_int(line.get(11)?)?
    };
    Ok(Timer {
        rank: parse_rank(line.pair(0)?, version)?,
        name: line.pair(1)?.to_string(),
        value: parse_float(line.pair(2)?)?,
        error: parse_float(line.pair(3)?)?,
        count: parse_int(line.get(9)?)?,
        pause,
    })
}

fn parse_rank(token: &str, version: FormatVersion) -> Result<RankId, FormatError> {
    if version < FormatVersion::V2_0_0 {
        if let Some(symbolic) = SymbolicRank::from_legacy_token(token) {
            return Ok(RankId::symbolic(symbolic));
        }
    }
    RankId::parse(token)
}

fn parse_date(text: &str) -> Result<i64, FormatError> {
    let date = NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map_err(|_| FormatError::InvalidDateTime(text.to_string()))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp())
}

fn parse_time(text: &str) -> Result<i64, FormatError> {
    let time = NaiveTime::parse_from_str(text, TIME_FORMAT)
        .map_err(|_| FormatError::InvalidDateTime(text.to_string()))?;
    Ok(i64::from(time.num_seconds_from_midnight()))
}

fn parse_int(text: &str) -> Result<i64, FormatError> {
    text.parse::<i64>()
        .map_err(|_| FormatError::InvalidNumber(text.to_string()))
}

/// Decimal floats plus `INF`/`-INF` in any case. NaN is not a valid sample.
fn parse_float(text: &str) -> Result<f64, FormatError> {
    match text.parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(FormatError::InvalidNumber(text.to_string())),
    }
}

/// Clock speed in MHz from `2930`, `2930MHz` or `2.93GHz`.
fn parse_clock(text: &str) -> Result<i64, FormatError> {
    let invalid = || FormatError::InvalidNumber(text.to_string());
    let caps = CLOCK_SPEED.captures(text).ok_or_else(invalid)?;
    let whole = &caps[1];
    let fraction = caps.get(2).map(|m| m.as_str()).unwrap_or("");
    let is_ghz = caps
        .get(3)
        .is_some_and(|unit| unit.as_str().eq_ignore_ascii_case("ghz"));

    if is_ghz {
        let ghz = format!("{}{}", whole, fraction)
            .parse::<f64>()
            .map_err(|_| invalid())?;
        Ok((ghz * 1000.0).round() as i64)
    } else {
        whole.parse::<i64>().map_err(|_| invalid())
    }
}
