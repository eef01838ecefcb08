use std::path::PathBuf;

use docsift_config::defaults::{
    DEFAULT_INPUT_DIR, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_DIR, DEFAULT_OUTPUT_FILE,
    DEFAULT_PDF_SUBDIR,
};
use docsift_config::schema::PathsConfig;

/// Where a run reads its descriptor and PDFs and writes its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub input_dir: PathBuf,
    pub pdf_subdir: String,
    pub input_file: String,
    pub output_dir: PathBuf,
    pub output_file: String,
}

impl Default for RunPaths {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            pdf_subdir: DEFAULT_PDF_SUBDIR.to_string(),
            input_file: DEFAULT_INPUT_FILE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }
}

impl RunPaths {
    pub fn from_config(paths: &PathsConfig) -> Self {
        let d = Self::default();
        Self {
            input_dir: paths.input_dir.as_ref().map(PathBuf::from).unwrap_or(d.input_dir),
            pdf_subdir: paths.pdf_subdir.clone().unwrap_or(d.pdf_subdir),
            input_file: paths.input_file.clone().unwrap_or(d.input_file),
            output_dir: paths.output_dir.as_ref().map(PathBuf::from).unwrap_or(d.output_dir),
            output_file: paths.output_file.clone().unwrap_or(d.output_file),
        }
    }

    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn input_path(&self) -> PathBuf {
        self.input_dir.join(&self.input_file)
    }

    pub fn pdf_dir(&self) -> PathBuf {
        self.input_dir.join(&self.pdf_subdir)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }
}
