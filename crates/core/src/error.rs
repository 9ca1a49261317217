use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Content source unreachable: {0}")]
    Transport(String),

    /// The query engine answered with one or more errors.
    #[error("Content query failed with {} error(s): {}", messages.len(), messages.join("; "))]
    ContentQuery { messages: Vec<String> },

    #[error("Could not query the CMS for pages: response has no '{key}' data")]
    MissingContentSource { key: String },

    #[error("Malformed page {page}: {reason}")]
    MalformedPage { page: String, reason: String },

    #[error("Could not build template for page {page}: {reason}")]
    TemplateBuild { page: String, reason: String },

    #[error("Page {page}: route already registered for path '{path}'")]
    DuplicateRoute { path: String, page: String },
}

impl Error {
    /// Whether the error belongs to a single page rather than the whole build.
    pub fn is_page_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedPage { .. } | Error::TemplateBuild { .. } | Error::DuplicateRoute { .. }
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_query_lists_every_message() {
        let err = Error::ContentQuery {
            messages: vec!["Unknown field 'foo'".into(), "Unknown fragment 'Bar'".into()],
        };
        let text = err.to_string();
        assert!(text.contains("2 error(s)"));
        assert!(text.contains("Unknown field 'foo'"));
        assert!(text.contains("Unknown fragment 'Bar'"));
    }

    #[test]
    fn test_page_errors_are_classified() {
        assert!(
            Error::MalformedPage {
                page: "a".into(),
                reason: "b".into()
            }
            .is_page_error()
        );
        assert!(!Error::MissingContentSource { key: "cms".into() }.is_page_error());
        assert!(!Error::ContentQuery { messages: vec![] }.is_page_error());
    }
}
