//! Table definitions for the results database.

use super::TableSchema;
use crate::core::{Column, DataType};

fn text(name: &str) -> Column {
    Column::new(name, DataType::Text)
}

fn int(name: &str) -> Column {
    Column::new(name, DataType::Integer)
}

fn version_columns() -> Vec<Column> {
    vec![int("VersionMajor"), int("VersionMinor"), int("VersionBuild")]
}

pub fn application() -> TableSchema {
    let mut columns = vec![text("Name").not_null()];
    columns.extend(version_columns());
    columns.extend([
        text("VersionCode"),
        text("Description"),
        Column::new("Private", DataType::Boolean),
        text("FullName"),
    ]);
    TableSchema::new("Application", columns).with_unique_key(&[
        "Name",
        "VersionMajor",
        "VersionMinor",
        "VersionCode",
    ])
}

fn vendor_product(name: &str) -> TableSchema {
    let mut columns = vec![text("Name").not_null(), text("Vendor")];
    columns.extend(version_columns());
    TableSchema::new(name, columns).with_unique_key(&[
        "Name",
        "Vendor",
        "VersionMajor",
        "VersionMinor",
        "VersionBuild",
    ])
}

pub fn compiler() -> TableSchema {
    vendor_product("Compiler")
}

pub fn mpi() -> TableSchema {
    vendor_product("MPI")
}

pub fn machine() -> TableSchema {
    TableSchema::new("Machine", vec![text("Name").not_null(), text("Vendor")])
        .with_unique_key(&["Name", "Vendor"])
}

pub fn operating_system() -> TableSchema {
    let mut columns = vec![text("Name").not_null(), text("Vendor")];
    columns.extend(version_columns());
    columns.extend([text("VersionBuildMinor"), text("Kernel")]);
    TableSchema::new("OperatingSystem", columns).with_unique_key(&[
        "Name",
        "Vendor",
        "VersionMajor",
        "VersionMinor",
        "VersionBuild",
        "VersionBuildMinor",
        "Kernel",
    ])
}

pub fn processor() -> TableSchema {
    TableSchema::new(
        "Processor",
        vec![
            text("Name").not_null(),
            text("Vendor"),
            text("ProcessorArchitecture"),
            int("CoresPerProcessor"),
            int("ThreadsPerCore"),
            int("ClockSpeedHz"),
        ],
    )
    .with_unique_key(&[
        "Name",
        "Vendor",
        "ProcessorArchitecture",
        "CoresPerProcessor",
        "ThreadsPerCore",
        "ClockSpeedHz",
    ])
}

pub fn flags() -> TableSchema {
    TableSchema::new("Flags", vec![text("Flag").not_null()]).with_unique_key(&["Flag"])
}

/// Runs carry no store-level key: a run is matched by RunID when the file
/// has one, which the key columns below cannot express.
pub fn run() -> TableSchema {
    TableSchema::new(
        "Run",
        vec![
            text("RunCreator"),
            Column::new("Date", DataType::Timestamp),
            Column::new("Private", DataType::Boolean),
            int("Machine"),
            int("OperatingSystem"),
            int("Processor"),
            int("Compiler"),
            int("MPI"),
            int("Application"),
            Column::new("RunDate", DataType::Timestamp),
            text("RunID"),
            text("Tag"),
            text("File"),
        ],
    )
}

pub fn sub_run() -> TableSchema {
    TableSchema::new("SubRun", vec![int("ParentRun").not_null(), int("Sequence").not_null()])
        .with_unique_key(&["ParentRun", "Sequence"])
}

pub fn parameter() -> TableSchema {
    TableSchema::new(
        "Parameter",
        vec![
            text("Name").not_null(),
            text("Type").not_null(),
            int("SubRunOwner").not_null(),
            Column::new("DoubleValue", DataType::Float),
            int("IntegerValue"),
            text("StringValue"),
            int("Rank"),
            int("ThreadID"),
        ],
    )
}

pub fn result() -> TableSchema {
    TableSchema::new(
        "Result",
        vec![
            text("Name").not_null(),
            Column::new("Value", DataType::Float),
            Column::new("Error", DataType::Float),
            int("Rank"),
            int("ThreadID"),
            text("ErrorType"),
            int("SubRun").not_null(),
            int("Count"),
            int("PauseCount"),
        ],
    )
}

/// Every table an import writes to.
pub fn all_tables() -> Vec<TableSchema> {
    vec![
        application(),
        compiler(),
        machine(),
        mpi(),
        operating_system(),
        processor(),
        flags(),
        run(),
        sub_run(),
        parameter(),
        result(),
    ]
}
