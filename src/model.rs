//! In-memory record set produced by reading one PMTM file.
//!
//! Every file version is read into these same structures, so nothing
//! downstream needs to know which version a file was.

use crate::format::rank::RankId;
use crate::format::version::FormatVersion;
use chrono::{DateTime, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref INTEGER_VALUE: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
    static ref DOUBLE_VALUE: Regex = Regex::new(r"^[+-]?\d+\.\d*([eE][+-]?\d+)?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    pub vendor: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub kernel: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processor {
    pub vendor: String,
    pub name: String,
    pub arch: String,
    /// Clock speed in MHz.
    pub clock: i64,
    pub nprocs: i64,
    pub nthreads: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiler {
    pub vendor: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mpi {
    pub vendor: String,
    pub name: String,
    pub version: String,
}

/// A parameter value, typed from its text the way the store columns expect.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Double(f64),
    Integer(i64),
    Text(String),
}

impl ParamValue {
    pub fn classify(raw: &str) -> Self {
        let value = raw.trim();
        let lowered = value.to_ascii_lowercase();
        if lowered == "true" || lowered == "false" {
            return Self::Text(lowered);
        }
        if INTEGER_VALUE.is_match(value) {
            if let Ok(i) = value.parse::<i64>() {
                return Self::Integer(i);
            }
        }
        if INTEGER_VALUE.is_match(value) || DOUBLE_VALUE.is_match(value) {
            if let Ok(f) = value.parse::<f64>() {
                return Self::Double(f);
            }
        }
        Self::Text(value.to_string())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Double(_) => "Double",
            Self::Integer(_) => "Integer",
            Self::Text(_) => "String",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub rank: RankId,
    pub name: String,
    pub value: ParamValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    pub rank: RankId,
    pub name: String,
    pub value: f64,
    pub error: f64,
    pub count: i64,
    pub pause: i64,
}

/// Cost of the timing calls themselves, measured once per file.
#[derive(Debug, Clone, PartialEq)]
pub struct Overhead {
    pub name: String,
    pub value: f64,
    pub error: f64,
}

impl Overhead {
    pub const NAME_PREFIX: &'static str = "Timer overhead for ";
    pub const COUNT: i64 = 10000;

    /// The overhead as the timer row it is stored as.
    pub fn to_timer(&self) -> Timer {
        Timer {
            rank: RankId::symbolic(crate::format::rank::SymbolicRank::AllRanks),
            name: format!("{}{}", Self::NAME_PREFIX, self.name),
            value: self.value,
            error: self.error,
            count: Self::COUNT,
            pause: 0,
        }
    }
}

/// Everything read from one file.
#[derive(Debug, Clone, PartialEq)]
pub struct PmtmRecord {
    pub version: FormatVersion,
    pub application: Option<Application>,
    pub machine: Option<Machine>,
    pub os: Option<Os>,
    pub processor: Option<Processor>,
    pub compiler: Option<Compiler>,
    pub mpi: Option<Mpi>,
    pub run_id: Option<String>,
    pub nprocs: Option<String>,
    pub max_openmp_threads: Option<String>,
    pub tag: Option<String>,
    pub flags: Vec<String>,
    /// Seconds since the epoch, accumulated from the date and time lines.
    pub timestamp: i64,
    pub environ: BTreeMap<String, String>,
    pub parameters: Vec<Parameter>,
    pub timers: Vec<Timer>,
    pub overheads: Vec<Overhead>,
}

impl PmtmRecord {
    pub fn run_date(&self) -> NaiveDateTime {
        DateTime::from_timestamp(self.timestamp, 0)
            .map(|dt| dt.naive_utc())
            .unwrap_or_default()
    }
}
