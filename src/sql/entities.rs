//! Row descriptors for each results-database table.

use super::entity::{Entity, business_key};
use crate::core::Value;
use crate::format::rank::{RankId, SymbolicRank};
use crate::format::version::VersionParts;
use crate::model::{self, ParamValue};
use chrono::NaiveDateTime;

// ============================================================================
// Dimensions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub name: String,
    pub version: VersionParts,
}

impl From<&model::Application> for Application {
    fn from(app: &model::Application) -> Self {
        Self {
            name: app.name.clone(),
            version: VersionParts::decompose(&app.version),
        }
    }
}

impl Entity for Application {
    const TABLE: &'static str = "Application";
    const BUSINESS_KEY: &'static [&'static str] =
        &["Name", "VersionMajor", "VersionMinor", "VersionCode"];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Name", self.name.as_str().into()),
            ("VersionMajor", self.version.major.into()),
            ("VersionMinor", self.version.minor.into()),
            ("VersionBuild", self.version.build.into()),
            ("VersionCode", self.version.code.as_str().into()),
            ("Description", "".into()),
            ("Private", false.into()),
            ("FullName", "".into()),
        ]
    }
}

/// Compilers and MPI libraries share a layout and differ only by table.
#[derive(Debug, Clone, PartialEq)]
pub struct Toolchain<const MPI: bool> {
    pub name: String,
    pub vendor: String,
    pub version: VersionParts,
}

pub type Compiler = Toolchain<false>;
pub type Mpi = Toolchain<true>;

impl<const MPI: bool> Toolchain<MPI> {
    fn new(vendor: &str, name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            vendor: vendor.to_string(),
            version: VersionParts::decompose(version),
        }
    }
}

impl From<&model::Compiler> for Compiler {
    fn from(c: &model::Compiler) -> Self {
        Self::new(&c.vendor, &c.name, &c.version)
    }
}

impl From<&model::Mpi> for Mpi {
    fn from(m: &model::Mpi) -> Self {
        Self::new(&m.vendor, &m.name, &m.version)
    }
}

impl<const MPI: bool> Entity for Toolchain<MPI> {
    const TABLE: &'static str = if MPI { "MPI" } else { "Compiler" };
    const BUSINESS_KEY: &'static [&'static str] =
        &["Name", "Vendor", "VersionMajor", "VersionMinor", "VersionBuild"];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Name", self.name.as_str().into()),
            ("Vendor", self.vendor.as_str().into()),
            ("VersionMajor", self.version.major.into()),
            ("VersionMinor", self.version.minor.into()),
            ("VersionBuild", self.version.build.into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Machine {
    pub name: String,
    pub vendor: Option<String>,
}

impl From<&model::Machine> for Machine {
    fn from(m: &model::Machine) -> Self {
        Self {
            name: m.name.clone(),
            vendor: m.vendor.clone(),
        }
    }
}

impl Entity for Machine {
    const TABLE: &'static str = "Machine";
    const BUSINESS_KEY: &'static [&'static str] = &["Name", "Vendor"];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Name", self.name.as_str().into()),
            ("Vendor", self.vendor.clone().into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatingSystem {
    pub name: String,
    pub vendor: String,
    pub version: VersionParts,
    pub kernel: String,
}

impl From<&model::Os> for OperatingSystem {
    fn from(os: &model::Os) -> Self {
        Self {
            name: os.name.clone(),
            vendor: os.vendor.clone(),
            version: VersionParts::decompose(&os.version),
            kernel: os.kernel.clone(),
        }
    }
}

impl Entity for OperatingSystem {
    const TABLE: &'static str = "OperatingSystem";
    const BUSINESS_KEY: &'static [&'static str] = &[
        "Name",
        "VersionMajor",
        "VersionMinor",
        "VersionBuild",
        "Vendor",
        "VersionBuildMinor",
        "Kernel",
    ];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("Name", self.name.as_str().into()),
            ("Vendor", self.vendor.as_str().into()),
            ("VersionMajor", self.version.major.into()),
            ("VersionMinor", self.version.minor.into()),
            ("VersionBuild", self.version.build.into()),
            ("VersionBuildMinor", self.version.code.as_str().into()),
            ("Kernel", self.kernel.as_str().into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Processor(pub model::Processor);

impl Entity for Processor {
    const TABLE: &'static str = "Processor";
    const BUSINESS_KEY: &'static [&'static str] = &[
        "Name",
        "Vendor",
        "ProcessorArchitecture",
        "CoresPerProcessor",
        "ThreadsPerCore",
        "ClockSpeedHz",
    ];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        let p = &self.0;
        vec![
            ("Name", p.name.as_str().into()),
            ("Vendor", p.vendor.as_str().into()),
            ("ProcessorArchitecture", p.arch.as_str().into()),
            ("CoresPerProcessor", p.nprocs.into()),
            ("ThreadsPerCore", p.nthreads.into()),
            ("ClockSpeedHz", p.clock.into()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flag(pub String);

impl Entity for Flag {
    const TABLE: &'static str = "Flags";
    const BUSINESS_KEY: &'static [&'static str] = &["Flag"];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![("Flag", self.0.as_str().into())]
    }
}

// ============================================================================
// Runs
// ============================================================================

/// Stored IDs of the dimensions a run refers to. Absent dimensions are NULL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct DimensionIds {
    pub application: Option<i64>,
    pub compiler: Option<i64>,
    pub machine: Option<i64>,
    pub mpi: Option<i64>,
    pub os: Option<i64>,
    pub processor: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub creator: String,
    /// When the run was imported.
    pub imported_at: NaiveDateTime,
    pub dimensions: DimensionIds,
    pub run_date: NaiveDateTime,
    pub run_id: Option<String>,
    pub tag: Option<String>,
    pub file: String,
}

impl Entity for Run {
    const TABLE: &'static str = "Run";
    const BUSINESS_KEY: &'static [&'static str] = &[
        "RunCreator",
        "Machine",
        "OperatingSystem",
        "Processor",
        "Compiler",
        "MPI",
        "Application",
        "RunDate",
        "Tag",
    ];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        let d = &self.dimensions;
        vec![
            ("RunCreator", self.creator.as_str().into()),
            ("Date", self.imported_at.into()),
            ("Private", false.into()),
            ("Machine", d.machine.into()),
            ("OperatingSystem", d.os.into()),
            ("Processor", d.processor.into()),
            ("Compiler", d.compiler.into()),
            ("MPI", d.mpi.into()),
            ("Application", d.application.into()),
            ("RunDate", self.run_date.into()),
            ("RunID", self.run_id.clone().into()),
            ("Tag", self.tag.clone().into()),
            ("File", self.file.as_str().into()),
        ]
    }

    /// A run ID written by the timing library identifies the run on its own.
    fn lookup(&self) -> Vec<(&'static str, Value)> {
        match self.run_id.as_deref() {
            Some(run_id) if !run_id.is_empty() => vec![("RunID", run_id.into())],
            _ => business_key(self),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubRun {
    pub parent_run: i64,
    pub sequence: i64,
}

impl Entity for SubRun {
    const TABLE: &'static str = "SubRun";
    const BUSINESS_KEY: &'static [&'static str] = &["ParentRun", "Sequence"];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("ParentRun", self.parent_run.into()),
            ("Sequence", self.sequence.into()),
        ]
    }
}

// ============================================================================
// Samples
// ============================================================================

/// A parameter stored under a sub-run. Never deduplicated.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub sub_run: i64,
    pub name: String,
    pub value: ParamValue,
    pub rank: RankId,
}

impl ParameterRow {
    pub fn new(sub_run: i64, parameter: &model::Parameter) -> Self {
        Self {
            sub_run,
            name: parameter.name.clone(),
            value: parameter.value.clone(),
            rank: parameter.rank,
        }
    }

    /// The process count, recorded as a parameter of unknown rank.
    pub fn pe_count(sub_run: i64, nprocs: &str) -> Self {
        Self {
            sub_run,
            name: "PE Count".to_string(),
            value: ParamValue::classify(nprocs),
            rank: RankId::symbolic(SymbolicRank::Unknown),
        }
    }
}

impl Entity for ParameterRow {
    const TABLE: &'static str = "Parameter";
    const BUSINESS_KEY: &'static [&'static str] = &[];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        let (double, integer, string) = match &self.value {
            ParamValue::Double(d) => (Value::Float(*d), Value::Null, Value::Null),
            ParamValue::Integer(i) => (Value::Null, Value::Integer(*i), Value::Null),
            ParamValue::Text(s) => (Value::Null, Value::Null, Value::Text(s.clone())),
        };
        vec![
            ("Name", self.name.as_str().into()),
            ("Type", self.value.type_name().into()),
            ("SubRunOwner", self.sub_run.into()),
            ("DoubleValue", double),
            ("IntegerValue", integer),
            ("StringValue", string),
            ("Rank", self.rank.rank.into()),
            ("ThreadID", self.rank.thread.into()),
        ]
    }
}

/// A timer (or timer overhead) stored under a sub-run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub sub_run: i64,
    pub timer: model::Timer,
}

impl ResultRow {
    pub const ERROR_TYPE: &'static str = "PMTM_STANDARD";
}

impl Entity for ResultRow {
    const TABLE: &'static str = "Result";
    const BUSINESS_KEY: &'static [&'static str] = &[];

    fn columns(&self) -> Vec<(&'static str, Value)> {
        let t = &self.timer;
        vec![
            ("Name", t.name.as_str().into()),
            ("Value", t.value.into()),
            ("Error", t.error.into()),
            ("Rank", t.rank.rank.into()),
            ("ThreadID", t.rank.thread.into()),
            ("ErrorType", Self::ERROR_TYPE.into()),
            ("SubRun", self.sub_run.into()),
            ("Count", t.count.into()),
            ("PauseCount", t.pause.into()),
        ]
    }
}
