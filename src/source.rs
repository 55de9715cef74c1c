//! `path#start:end` addressing for the `tests` command.
//!
//! Lines are 1-indexed and inclusive. Either bound may be omitted:
//! `file.rs#3:5`, `file.rs#3` and `file.rs#3:` run from line 3 to the end,
//! `file.rs#:5` runs from the start to line 5.

use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSelector {
    pub path: PathBuf,
    pub start: usize,
    /// None = through the last line.
    pub end: Option<usize>,
}

impl SourceSelector {
    pub fn parse(spec: &str) -> Result<Self, AppError> {
        let Some((path, range)) = spec.split_once('#') else {
            return Ok(Self {
                path: PathBuf::from(spec),
                start: 1,
                end: None,
            });
        };

        let invalid = || AppError::validation(format!("Invalid line selectors in file path: {spec}"));
        let bound = |text: &str| -> Result<Option<usize>, AppError> {
            if text.is_empty() {
                Ok(None)
            } else {
                text.trim().parse::<usize>().map(Some).map_err(|_| invalid())
            }
        };

        let (start, end) = match range.split_once(':') {
            Some((s, e)) => (bound(s)?, bound(e)?),
            None => (bound(range)?, None),
        };
        let start = start.unwrap_or(1);

        if start == 0 || end == Some(0) {
            return Err(AppError::validation(format!(
                "Line numbers start at 1: {spec}"
            )));
        }
        if end.is_some_and(|e| e < start) {
            return Err(invalid());
        }

        Ok(Self {
            path: PathBuf::from(path),
            start,
            end,
        })
    }

    /// Select the addressed lines out of `text`. The end bound is clamped to
    /// the last line; a start past the end of the file is an error.
    pub fn select(&self, text: &str) -> Result<String, AppError> {
        let lines: Vec<&str> = text.split('\n').collect();
        let last = self.end.unwrap_or(lines.len()).min(lines.len());
        let picked = lines
            .get(self.start.saturating_sub(1)..last)
            .filter(|_| self.start <= lines.len())
            .ok_or_else(|| {
                AppError::validation(format!(
                    "{} has {} lines, cannot start at line {}",
                    self.path.display(),
                    lines.len(),
                    self.start
                ))
            })?;
        Ok(picked.join("\n"))
    }

    /// Read the file and return the addressed lines.
    pub fn read(&self) -> Result<String, AppError> {
        let text = std::fs::read_to_string(&self.path)?;
        self.select(&text)
    }
}
