// Stage sequencing.
//
// Step I, per configured sheet: workbook sheet -> temporary CSV -> raw pivot
// -> interpolated copy -> excluded months dropped from both -> testing subset
// -> two output files; the temporary CSV is removed when the step ends.
// Step II: supercoarse CSV -> training table -> one output file.
use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::config::{Config, SheetJob};
use crate::error::Result;
use crate::extract::{extract_sheet, IntermediateFile};
use crate::interpolate::interpolate;
use crate::loader::load_csv;
use crate::output::{ensure_parent, preview_wide, write_json, write_wide_csv};
use crate::pivot::{build_pivot, PivotSpec};
use crate::training::{synthesize_training, TrainingSpec};
use crate::types::{FillSummary, TallTable, WideTable};
use crate::unique::{unique_values, SkippedDataset};
use crate::util::{format_int, is_year_month};

const INDEX_LABEL: &str = "month";
const PREVIEW_ROWS: usize = 3;
const PREVIEW_COLS: usize = 6;

/// Sorted row and column keys for one wide table.
#[derive(Debug, Clone)]
pub struct Axes {
    pub months: Vec<String>,
    pub regions: Vec<String>,
    pub skipped: Vec<SkippedDataset>,
}

/// Month and region sets of `table`, each validated by its substring check.
pub fn discover_axes(table: &TallTable, region_column: &str, config: &Config) -> Axes {
    let months = unique_values(&[table], &config.month_column, &config.month_checker);
    let regions = unique_values(&[table], region_column, &config.region_checker);

    let months_sorted = months.sorted();
    // String order is month order only for YYYY-MM tokens.
    for month in months_sorted.iter().filter(|m| !is_year_month(m)) {
        warn!(
            "{}: month token '{}' is not YYYY-MM; row order may not be chronological",
            table.name, month
        );
    }

    let mut skipped = months.skipped;
    skipped.extend(regions.skipped.iter().cloned());
    Axes {
        months: months_sorted,
        regions: regions.sorted(),
        skipped,
    }
}

#[derive(Debug, Clone)]
pub struct TestingTables {
    pub raw: WideTable,
    pub testing: WideTable,
    pub fills: Vec<FillSummary>,
    pub skipped: Vec<SkippedDataset>,
}

/// Raw, interpolated and testing tables from one extracted sheet.
pub fn build_testing_tables(
    config: &Config,
    region_column: &str,
    table: &TallTable,
) -> Result<TestingTables> {
    let axes = discover_axes(table, region_column, config);
    let spec = PivotSpec {
        month_column: &config.month_column,
        region_column,
        value_column: &config.smeb_column,
    };
    let mut raw = build_pivot(
        table,
        spec,
        &axes.months,
        &axes.regions,
        config.aggregation,
    )?;
    let (mut interpolated, fills) = interpolate(&raw, config.debug_output);

    raw.drop_months(&config.excluded_months)?;
    interpolated.drop_months(&config.excluded_months)?;
    let testing = interpolated.select_regions(&config.testing_regions)?;

    Ok(TestingTables {
        raw,
        testing,
        fills,
        skipped: axes.skipped,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetSummary {
    pub sheet: String,
    pub raw_output: String,
    pub testing_output: String,
    pub months: usize,
    pub regions: usize,
    pub skipped_datasets: Vec<SkippedDataset>,
    pub interpolation: Vec<FillSummary>,
}

/// Step I for one sheet. The temporary CSV is removed on every exit path.
pub fn run_sheet_job(config: &Config, job: &SheetJob) -> Result<SheetSummary> {
    let intermediate = IntermediateFile::new(config.processed(&job.intermediate_file));
    ensure_parent(intermediate.path())?;

    if config.debug_output {
        info!(
            "Reading sheet '{}' of {}...",
            job.sheet,
            config.workbook_path.display()
        );
    }
    let report = extract_sheet(&config.workbook_path, &job.sheet, intermediate.path())?;
    if config.debug_output {
        info!(
            "Extracted {} rows x {} columns to {}",
            format_int(report.rows),
            report.columns,
            intermediate.path().display()
        );
    }
    let table = load_csv(intermediate.path())?;

    if config.debug_output {
        info!("Extracting SMEB values per '{}' with interpolation...", job.region_column);
    }
    let tables = build_testing_tables(config, &job.region_column, &table)?;

    let raw_path = config.processed(&job.raw_output);
    let testing_path = config.processed(&job.testing_output);
    write_wide_csv(&raw_path, &tables.raw, INDEX_LABEL)?;
    write_wide_csv(&testing_path, &tables.testing, INDEX_LABEL)?;

    if config.debug_output {
        info!(
            "Stored as {} and {}",
            raw_path.display(),
            testing_path.display()
        );
        preview_wide(&tables.testing, PREVIEW_ROWS, PREVIEW_COLS);
    }

    Ok(SheetSummary {
        sheet: job.sheet.clone(),
        raw_output: raw_path.display().to_string(),
        testing_output: testing_path.display().to_string(),
        months: tables.raw.months.len(),
        regions: tables.raw.regions.len(),
        skipped_datasets: tables.skipped,
        interpolation: tables.fills,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingSummary {
    pub output: String,
    pub months: usize,
    pub regions: usize,
    pub skipped_datasets: Vec<SkippedDataset>,
}

/// Training table from a loaded supercoarse file, excluded months dropped.
pub fn build_training_table(config: &Config, table: &TallTable) -> Result<(WideTable, Axes)> {
    let axes = discover_axes(table, &config.training_region_column, config);
    let spec = TrainingSpec {
        month_column: &config.month_column,
        region_column: &config.training_region_column,
        multiplier: config.smeb_multiplier,
        empty_group_policy: config.empty_group_policy,
    };
    let mut training = synthesize_training(table, &spec, &axes.months, &axes.regions)?;
    training.drop_months(&config.excluded_months)?;
    Ok((training, axes))
}

/// Step II.
pub fn run_training(config: &Config, supercoarse: &Path) -> Result<TrainingSummary> {
    info!("Loading processed data of the imputation team.");
    let table = load_csv(supercoarse)?;
    info!("Processing data and calculating SMEB values.");
    let (training, axes) = build_training_table(config, &table)?;

    let path = config.processed(&config.training_output);
    write_wide_csv(&path, &training, INDEX_LABEL)?;
    if config.debug_output {
        info!("Stored as {}", path.display());
        preview_wide(&training, PREVIEW_ROWS, PREVIEW_COLS);
    }

    Ok(TrainingSummary {
        output: path.display().to_string(),
        months: training.months.len(),
        regions: training.regions.len(),
        skipped_datasets: axes.skipped,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub sheets: Vec<SheetSummary>,
    pub training: Option<TrainingSummary>,
}

/// Run both steps and write the run report.
pub fn run(config: &Config) -> Result<RunSummary> {
    if config.debug_output {
        info!("Started data cleaning process...");
        info!("Step I: Creating testing data from the original spreadsheet.");
    }
    let mut sheets = Vec::with_capacity(config.sheets.len());
    for job in &config.sheets {
        sheets.push(run_sheet_job(config, job)?);
    }
    if config.debug_output {
        info!("Done with Step I.");
    }

    let training = match &config.supercoarse_path {
        Some(path) => {
            info!("Step II: Generating training data from {}.", path.display());
            let summary = run_training(config, path)?;
            info!("Done with Step II.");
            Some(summary)
        }
        None => {
            info!("Step II skipped: no supercoarse file configured.");
            None
        }
    };

    let summary = RunSummary { sheets, training };
    let summary_path = config.processed(&config.summary_output);
    write_json(&summary_path, &summary)?;

    let skipped: usize = summary
        .sheets
        .iter()
        .map(|s| s.skipped_datasets.len())
        .chain(summary.training.iter().map(|t| t.skipped_datasets.len()))
        .sum();
    info!(
        "Data extraction complete ({} skipped datasets, report at {}).",
        format_int(skipped),
        summary_path.display()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use rust_xlsxwriter::Workbook;
    use std::fs;

    fn config_in(dir: &Path) -> Config {
        Config {
            workbook_path: dir.join("missing.xlsx"),
            supercoarse_path: None,
            processed_dir: dir.join("processed"),
            excluded_months: vec!["2016-11".to_string()],
            testing_regions: vec!["SY020001".to_string(), "SY020400".to_string()],
            debug_output: false,
            ..Config::default()
        }
    }

    fn sheet_table() -> TallTable {
        let rows = [
            ("2016-11", "SY020001", "1"),
            ("2016-11", "SY020400", "1"),
            ("2016-11", "SY070002", "1"),
            ("2016-12", "SY020001", "10"),
            ("2016-12", "SY020001", "12"),
            ("2016-12", "SY020400", "20"),
            ("2017-01", "SY020400", "30"),
            ("2017-02", "SY020001", "14"),
            ("2017-02", "SY020400", ""),
            ("2017-03", "SY020400", "50"),
            ("2017-03", "SY070002", "8"),
        ];
        TallTable::new(
            "sheet",
            vec!["q_sbd".into(), "month2".into(), "Price_SMEB_total_wfloat".into()],
            rows.iter()
                .map(|(m, r, v)| vec![r.to_string(), m.to_string(), v.to_string()])
                .collect(),
        )
    }

    /// Workbook holding `sheet_table()` on the configured sheet; blank prices
    /// are left as empty cells.
    fn write_workbook(config: &Config) {
        let table = sheet_table();
        let mut book = Workbook::new();
        let sheet = book.add_worksheet();
        sheet.set_name(&config.sheets[0].sheet).unwrap();
        for (c, header) in table.headers.iter().enumerate() {
            sheet.write_string(0, c as u16, header).unwrap();
        }
        for (r, row) in table.rows.iter().enumerate() {
            let r = r as u32 + 1;
            sheet.write_string(r, 0, &row[0]).unwrap();
            sheet.write_string(r, 1, &row[1]).unwrap();
            if let Ok(price) = row[2].parse::<f64>() {
                sheet.write_number(r, 2, price).unwrap();
            }
        }
        book.save(&config.workbook_path).unwrap();
    }

    #[test]
    fn sheet_job_writes_raw_and_testing_tables() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write_workbook(&config);

        let summary = run(&config).unwrap();

        let job = &config.sheets[0];
        assert_eq!(
            fs::read_to_string(config.processed(&job.raw_output)).unwrap(),
            "month,SY020001,SY020400,SY070002\n\
             2016-12,11.0,20.0,\n\
             2017-01,,30.0,\n\
             2017-02,14.0,,\n\
             2017-03,,50.0,8.0\n"
        );
        assert_eq!(
            fs::read_to_string(config.processed(&job.testing_output)).unwrap(),
            "month,SY020001,SY020400\n\
             2016-12,11.0,20.0\n\
             2017-01,12.5,30.0\n\
             2017-02,14.0,40.0\n\
             2017-03,,50.0\n"
        );
        assert!(!config.processed(&job.intermediate_file).exists());
        assert!(config.processed(&config.summary_output).exists());
        assert_eq!(summary.sheets[0].months, 4);
        assert!(summary.training.is_none());
    }

    #[test]
    fn failed_selection_still_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.testing_regions.push("SY999999".to_string());
        write_workbook(&config);

        let err = run_sheet_job(&config, &config.sheets[0]).unwrap_err();

        assert!(matches!(err, PipelineError::MissingRegion(r) if r == "SY999999"));
        assert!(!config
            .processed(&config.sheets[0].intermediate_file)
            .exists());
        assert!(!config.processed(&config.sheets[0].testing_output).exists());
    }

    #[test]
    fn testing_tables_are_aligned_and_subset() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let t = build_testing_tables(&config, "q_sbd", &sheet_table()).unwrap();

        let months = vec!["2016-12", "2017-01", "2017-02", "2017-03"];
        assert_eq!(t.raw.months, months);
        assert_eq!(t.raw.months, t.testing.months);
        assert_eq!(t.raw.regions, vec!["SY020001", "SY020400", "SY070002"]);
        assert_eq!(t.testing.regions, vec!["SY020001", "SY020400"]);

        assert_eq!(t.raw.get("2016-12", "SY020001"), Some(11.0));
        assert_eq!(t.raw.get("2017-01", "SY020001"), None);
        assert_eq!(t.testing.get("2017-01", "SY020001"), Some(12.5));
        assert_eq!(t.testing.get("2017-02", "SY020400"), Some(40.0));
        // trailing gap is not extrapolated
        assert_eq!(t.testing.get("2017-03", "SY020001"), None);
        assert!(t.skipped.is_empty());
    }

    #[test]
    fn unknown_testing_region_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.testing_regions.push("SY999999".to_string());
        let err = build_testing_tables(&config, "q_sbd", &sheet_table()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingRegion(r) if r == "SY999999"));
    }

    #[test]
    fn invalid_region_codes_reject_the_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = sheet_table();
        table.rows[0][0] = "XX000000".to_string();
        let axes = discover_axes(&table, "q_sbd", &config_in(dir.path()));
        assert!(axes.regions.is_empty());
        assert_eq!(axes.months.len(), 5);
        assert_eq!(axes.skipped.len(), 1);
    }

    #[test]
    fn training_step_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("impute_supercoarse.csv");
        fs::write(
            &input,
            "month2,q_sbd,flour,water\n\
             2016-11,SY020001,1,1\n\
             2018-05,SY020001,2.0,4.5\n\
             2018-05,SY020002,4,4\n\
             2016-11,SY020002,1,1\n",
        )
        .unwrap();
        let config = config_in(dir.path());

        let summary = run_training(&config, &input).unwrap();

        assert_eq!(summary.months, 1);
        assert_eq!(summary.regions, 2);
        let text = fs::read_to_string(config.processed("imputed_training_data.csv")).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("month,SY020001,SY020002"));
        let row: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(row[0], "2018-05");
        assert!((row[1].parse::<f64>().unwrap() - 6.5 * 1.075).abs() < 1e-12);
        assert_eq!(row[2], "8.6");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn failed_extraction_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let err = run(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Workbook { .. }));
        assert!(!config
            .processed(&config.sheets[0].intermediate_file)
            .exists());
        assert!(!config.processed(&config.summary_output).exists());
    }
}
