pub type RankraceResult<T> = Result<T, RankraceError>;

#[derive(thiserror::Error, Debug)]
pub enum RankraceError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("data validation error: record {row}: {message}")]
    DataValidation { row: u64, message: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RankraceError {
    pub fn data_validation(row: u64, message: impl Into<String>) -> Self {
        Self::DataValidation {
            row,
            message: message.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            RankraceError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            RankraceError::render("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn data_validation_names_the_record() {
        let err = RankraceError::data_validation(17, "population is not a number");
        let s = err.to_string();
        assert!(s.contains("record 17"));
        assert!(s.contains("population is not a number"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = RankraceError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
