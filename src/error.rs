use std::fmt;

/// Transform stages, in the order the pipeline runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SourceId,
    Host,
    FillTitles,
    Identity,
    NormalizeBody,
    TokenizeTitle,
    TokenizeBody,
    Deduplicate,
    DropIncomplete,
}

impl Stage {
    #[cfg(test)]
    pub const ALL: [Stage; 9] = [
        Stage::SourceId,
        Stage::Host,
        Stage::FillTitles,
        Stage::Identity,
        Stage::NormalizeBody,
        Stage::TokenizeTitle,
        Stage::TokenizeBody,
        Stage::Deduplicate,
        Stage::DropIncomplete,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::SourceId => "source_id",
            Stage::Host => "host",
            Stage::FillTitles => "fill_titles",
            Stage::Identity => "identity",
            Stage::NormalizeBody => "normalize_body",
            Stage::TokenizeTitle => "tokenize_title",
            Stage::TokenizeBody => "tokenize_body",
            Stage::Deduplicate => "deduplicate",
            Stage::DropIncomplete => "drop_incomplete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures that abort a whole transform run. Per-row problems never end up here.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("stage {stage}: row {row} has non-text content in `{field}`")]
    UnparseableText {
        stage: Stage,
        row: usize,
        field: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, TransformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_names_stage_and_row() {
        let err = TransformError::UnparseableText {
            stage: Stage::TokenizeBody,
            row: 4,
            field: "body",
        };
        assert_eq!(
            err.to_string(),
            "stage tokenize_body: row 4 has non-text content in `body`"
        );
    }
}
