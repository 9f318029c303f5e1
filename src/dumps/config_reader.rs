use crate::dumps::*;

use serde::Deserialize;

/// The optional configuration file of a run.
///
/// All the fields may be omitted. The paths are relative to the directory of the file.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    pub candidate1: Option<String>,
    pub candidate2: Option<String>,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    pub annotate: Option<bool>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "writeCsv")]
    pub write_csv: Option<bool>,
}

pub fn read_config(path: &str) -> CliResult<RunConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_config(&contents, path)
}

pub fn parse_config(contents: &str, path: &str) -> CliResult<RunConfig> {
    let config: RunConfig = serde_json::from_str(contents).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    Ok(config)
}
