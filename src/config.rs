// Run configuration.
//
// Everything the pipeline needs is collected here once at start-up and then
// passed by reference into each stage. Defaults reproduce the layout of the
// project's data directory.
use std::env;
use std::path::PathBuf;

/// How repeated observations for one (month, region) cell are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Median,
    Mean,
}

/// What a training cell becomes when no supercoarse row matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyGroupPolicy {
    /// Sum of nothing times the multiplier, i.e. `0.0`.
    Zero,
    /// Leave the cell missing.
    Missing,
}

/// One spreadsheet sheet to turn into a raw table and a testing table.
#[derive(Debug, Clone)]
pub struct SheetJob {
    pub sheet: String,
    /// Temporary CSV of the sheet, removed once the job finishes.
    pub intermediate_file: String,
    pub region_column: String,
    pub raw_output: String,
    pub testing_output: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub workbook_path: PathBuf,
    /// `None` skips the training table.
    pub supercoarse_path: Option<PathBuf>,
    pub processed_dir: PathBuf,
    pub sheets: Vec<SheetJob>,
    pub smeb_column: String,
    pub month_column: String,
    pub training_region_column: String,
    pub month_checker: String,
    pub region_checker: String,
    pub aggregation: Aggregation,
    /// Progress logs, per-region fill counts and table previews.
    pub debug_output: bool,
    /// Months dropped from every output; early survey rounds are mostly empty.
    pub excluded_months: Vec<String>,
    /// Subdistricts missing at most one month once the excluded months are gone.
    pub testing_regions: Vec<String>,
    pub smeb_multiplier: f64,
    pub empty_group_policy: EmptyGroupPolicy,
    pub training_output: String,
    pub summary_output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workbook_path: PathBuf::from(
                "../../data/raw/reach_syr_dataset_market monitoring_redesign_august2019_without_first_row.xlsx",
            ),
            supercoarse_path: Some(PathBuf::from("../../data/raw/impute_supercoarse.csv")),
            processed_dir: PathBuf::from("../../data/processed"),
            sheets: vec![SheetJob {
                sheet: "Subdistrict_Time Series".to_string(),
                intermediate_file: "extracted_sheet_subdistrict.csv".to_string(),
                region_column: "q_sbd".to_string(),
                raw_output: "subdistrict_smeb.csv".to_string(),
                testing_output: "testing_data.csv".to_string(),
            }],
            smeb_column: "Price_SMEB_total_wfloat".to_string(),
            month_column: "month2".to_string(),
            training_region_column: "q_sbd".to_string(),
            month_checker: "20".to_string(),
            region_checker: "SY".to_string(),
            aggregation: Aggregation::Median,
            debug_output: true,
            excluded_months: to_strings(&["2016-11", "2016-12", "2017-01"]),
            testing_regions: to_strings(&[
                "SY020001", "SY020400", "SY020600", "SY070002", "SY070005", "SY070301",
                "SY070402", "SY070403",
            ]),
            smeb_multiplier: 1.075,
            empty_group_policy: EmptyGroupPolicy::Zero,
            training_output: "imputed_training_data.csv".to_string(),
            summary_output: "cleaning_summary.json".to_string(),
        }
    }
}

impl Config {
    /// Defaults, with the input/output paths overridable from the environment
    /// (or a `.env` file): `SMEB_WORKBOOK`, `SMEB_SUPERCOARSE` and
    /// `SMEB_PROCESSED_DIR`. An empty `SMEB_SUPERCOARSE` disables the
    /// training stage.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(path) = env::var("SMEB_WORKBOOK") {
            config.workbook_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("SMEB_SUPERCOARSE") {
            let path = path.trim().to_string();
            config.supercoarse_path = (!path.is_empty()).then(|| PathBuf::from(path));
        }
        if let Ok(path) = env::var("SMEB_PROCESSED_DIR") {
            config.processed_dir = PathBuf::from(path);
        }
        config
    }

    pub fn processed(&self, file_name: &str) -> PathBuf {
        self.processed_dir.join(file_name)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
