use crate::infra::InMemoryResultStore;
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use exam_results::config::AppConfig;
use exam_results::error::AppError;
use exam_results::workflows::result_import::{
    ImportError, ImportSummary, ResultCollection, ResultImportService, UploadedFile,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum CollectionArg {
    #[default]
    ExamResults,
    CompetitiveExamResults,
}

impl From<CollectionArg> for ResultCollection {
    fn from(value: CollectionArg) -> Self {
        match value {
            CollectionArg::ExamResults => ResultCollection::ExamResults,
            CollectionArg::CompetitiveExamResults => ResultCollection::CompetitiveExamResults,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Result sheet to import
    pub(crate) path: PathBuf,
    /// Collection the rows are written to
    #[arg(long, value_enum, default_value_t = CollectionArg::ExamResults)]
    pub(crate) collection: CollectionArg,
    /// Validate the sheet and print the report without writing anything
    #[arg(long)]
    pub(crate) dry_run: bool,
    /// Date used for fallback batch years (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = Arc::new(InMemoryResultStore::default());
    let service = ResultImportService::new(args.collection.into(), store, config.import);

    match import_file(&service, &args) {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary.body())?);
            Ok(())
        }
        Err(ImportFailure::Read(err)) => Err(AppError::Io(err)),
        Err(ImportFailure::Rejected(err)) => {
            println!("{}", serde_json::to_string_pretty(&err.body())?);
            Err(AppError::Import(err))
        }
    }
}

enum ImportFailure {
    Read(std::io::Error),
    Rejected(ImportError),
}

fn import_file(
    service: &ResultImportService<InMemoryResultStore>,
    args: &ImportArgs,
) -> Result<ImportSummary, ImportFailure> {
    let file = read_upload(&args.path).map_err(ImportFailure::Read)?;
    let today = args.as_of.unwrap_or_else(|| Local::now().date_naive());

    let outcome = if args.dry_run {
        service.dry_run_as_of(file, today)
    } else {
        service.import_as_of(file, today)
    };
    outcome.map_err(ImportFailure::Rejected)
}

fn read_upload(path: &Path) -> Result<UploadedFile, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(UploadedFile {
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned()),
        content_type: Some(content_type.essence_str().to_string()),
        bytes,
    })
}
