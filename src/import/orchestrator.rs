//! Loads a parsed PMTM file into a store as one transaction.

use super::archive::Archive;
use crate::config::ImportConfig;
use crate::core::ImportError;
use crate::format::FormatReader;
use crate::model::PmtmRecord;
use crate::sql::{
    Application, Compiler, DimensionIds, Entity, Flag, Machine, Mpi, OperatingSystem,
    ParameterRow, Processor, ResultRow, Run, SubRun, Tracked,
};
use crate::storage::Store;
use crate::Result;
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What an import wrote, or would have written for a dry run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub file: PathBuf,
    /// The path recorded on the run.
    pub stored_file: PathBuf,
    pub run_id: i64,
    pub sub_run_id: i64,
    pub dimensions: DimensionIds,
    pub flags: usize,
    /// Includes the synthesized process count parameter.
    pub parameters: usize,
    pub timers: usize,
    pub overheads: usize,
    pub dry_run: bool,
    pub archived: Option<PathBuf>,
}

pub struct ImportOrchestrator {
    config: ImportConfig,
    archive: Option<Archive>,
}

impl ImportOrchestrator {
    pub fn new(config: ImportConfig) -> Self {
        let archive = config.archive_dir.clone().map(Archive::new);
        Self { config, archive }
    }

    /// Read `path` and import it. A file that fails to parse never reaches
    /// the store.
    pub fn import_file<S: Store + ?Sized>(&self, store: &mut S, path: &Path) -> Result<ImportReport> {
        let record = FormatReader::read_path(path)?;
        self.import_record(store, &record, path)
    }

    /// Import an already parsed file. Any failure rolls the transaction
    /// back before it is returned; a dry run rolls back even on success.
    pub fn import_record<S: Store + ?Sized>(
        &self,
        store: &mut S,
        record: &PmtmRecord,
        source: &Path,
    ) -> Result<ImportReport> {
        let stored_file = match &self.archive {
            Some(archive) => archive.destination(source)?,
            None => std::path::absolute(source)?,
        };

        let mut report = match save_record(store, record, &self.config.creator, &stored_file) {
            Ok(report) => report,
            Err(err) => return Err(abort(store, source, err)),
        };
        report.file = source.to_path_buf();
        report.stored_file = stored_file;

        if self.config.dry_run {
            store.rollback()?;
            report.dry_run = true;
            info!("Dry run of {} rolled back", source.display());
            return Ok(report);
        }

        if let Err(err) = store.commit() {
            return Err(abort(store, source, err.into()));
        }
        info!("Committed run {} from {}", report.run_id, source.display());

        if let Some(archive) = &self.archive {
            report.archived = Some(archive.store(source)?);
        }
        Ok(report)
    }
}

fn abort<S: Store + ?Sized>(store: &mut S, source: &Path, err: ImportError) -> ImportError {
    warn!("Error: file \"{}\", \"{}\"", source.display(), err);
    match store.rollback() {
        Ok(()) => info!("Rolled back import of {}", source.display()),
        Err(rollback_err) => warn!("Rollback failed: {}", rollback_err),
    }
    err
}

fn upsert<E: Entity, S: Store + ?Sized>(store: &mut S, entity: Option<E>) -> Result<Option<i64>> {
    entity
        .map(|entity| Tracked::new(entity).fetch_or_save(store))
        .transpose()
}

fn save_record<S: Store + ?Sized>(
    store: &mut S,
    record: &PmtmRecord,
    creator: &str,
    stored_file: &Path,
) -> Result<ImportReport> {
    let dimensions = DimensionIds {
        application: upsert(store, record.application.as_ref().map(Application::from))?,
        compiler: upsert(store, record.compiler.as_ref().map(Compiler::from))?,
        machine: upsert(store, record.machine.as_ref().map(Machine::from))?,
        mpi: upsert(store, record.mpi.as_ref().map(Mpi::from))?,
        os: upsert(store, record.os.as_ref().map(OperatingSystem::from))?,
        processor: upsert(store, record.processor.clone().map(Processor))?,
    };

    let mut flags = 0;
    for flag in record.flags.iter().filter(|flag| !flag.is_empty()) {
        Tracked::new(Flag(flag.clone())).fetch_or_save(store)?;
        flags += 1;
    }

    let mut run = Tracked::new(Run {
        creator: creator.to_string(),
        imported_at: Utc::now().naive_utc(),
        dimensions,
        run_date: record.run_date(),
        run_id: record.run_id.clone(),
        tag: record.tag.clone(),
        file: stored_file.to_string_lossy().into_owned(),
    });
    if let Some(existing) = run.fetch(store)? {
        return Err(ImportError::RunAlreadyImported(existing));
    }
    run.save(store, true)?;
    let run_id = run
        .id()
        .ok_or_else(|| ImportError::UnresolvedId(Run::TABLE.to_string()))?;
    info!("Inserted run {}", run_id);

    let sub_run_id = Tracked::new(SubRun {
        parent_run: run_id,
        sequence: 0,
    })
    .fetch_or_save(store)?;

    let mut parameters = 0;
    for parameter in &record.parameters {
        Tracked::new(ParameterRow::new(sub_run_id, parameter)).save(store, false)?;
        parameters += 1;
    }
    if let Some(nprocs) = record.nprocs.as_deref().filter(|n| !n.is_empty()) {
        Tracked::new(ParameterRow::pe_count(sub_run_id, nprocs)).save(store, false)?;
        parameters += 1;
    }

    for overhead in &record.overheads {
        let row = ResultRow {
            sub_run: sub_run_id,
            timer: overhead.to_timer(),
        };
        Tracked::new(row).save(store, false)?;
    }

    for timer in &record.timers {
        let row = ResultRow {
            sub_run: sub_run_id,
            timer: timer.clone(),
        };
        Tracked::new(row).save(store, false)?;
    }

    Ok(ImportReport {
        file: PathBuf::new(),
        stored_file: PathBuf::new(),
        run_id,
        sub_run_id,
        dimensions,
        flags,
        parameters,
        timers: record.timers.len(),
        overheads: record.overheads.len(),
        dry_run: false,
        archived: None,
    })
}
