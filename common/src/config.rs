use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{discover::Scenario, plot::Plot};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    pub plots: Vec<Box<dyn Plot>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where the performance test drops its CSV files
    pub results_dir: PathBuf,
    pub output_dir: PathBuf,
    pub scenarios: Vec<Scenario>,
    /// Fail instead of skipping a scenario with no result file
    pub strict: bool,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("."),
            output_dir: PathBuf::from("plots"),
            scenarios: Scenario::ALL.to_vec(),
            strict: false,
            format: ImageFormat::default(),
            width: 1600,
            height: 600,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }
}
