//! Documentation source: remote page, local file, or stdin.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::{debug, info};

/// Where the FFmpeg project publishes its filter documentation.
pub const DEFAULT_URL: &str = "https://ffmpeg.org/ffmpeg-filters.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Url(String),
    File(PathBuf),
    Stdin,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        source: Box<ureq::Error>,
    },
    #[error("failed to read response body from {url}: {source}")]
    Body { url: String, source: io::Error },
    #[error("failed to read {}: {source}", .path.display())]
    File { path: PathBuf, source: io::Error },
    #[error("failed to read stdin: {0}")]
    Stdin(#[source] io::Error),
}

impl Source {
    /// `-` is stdin, `http(s)://` is a URL, anything else a file path.
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Source::Stdin
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            Source::Url(arg.to_string())
        } else {
            Source::File(PathBuf::from(arg))
        }
    }

    /// Read the whole document. No retries.
    pub fn read(&self) -> Result<String, FetchError> {
        match self {
            Source::Url(url) => fetch(url),
            Source::File(path) => fs::read_to_string(path).map_err(|source| FetchError::File {
                path: path.clone(),
                source,
            }),
            Source::Stdin => {
                let mut input = String::new();
                io::stdin()
                    .read_to_string(&mut input)
                    .map_err(FetchError::Stdin)?;
                Ok(input)
            }
        }
    }
}

fn fetch(url: &str) -> Result<String, FetchError> {
    info!(url, "fetching documentation");
    let response = ureq::get(url).call().map_err(|e| FetchError::Http {
        url: url.to_string(),
        source: Box::new(e),
    })?;
    debug!(status = response.status(), "response received");

    // into_string() caps the body size; the filter page is large
    let mut body = String::new();
    response
        .into_reader()
        .read_to_string(&mut body)
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_kinds() {
        assert_eq!(Source::parse("-"), Source::Stdin);
        assert_eq!(
            Source::parse(DEFAULT_URL),
            Source::Url(DEFAULT_URL.to_string())
        );
        assert_eq!(
            Source::parse("http://localhost/f.html"),
            Source::Url("http://localhost/f.html".to_string())
        );
        assert_eq!(
            Source::parse("docs/filters.html"),
            Source::File(PathBuf::from("docs/filters.html"))
        );
    }

    #[test]
    fn read_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<h3>Filter a</h3>").unwrap();
        let source = Source::File(file.path().to_path_buf());
        assert_eq!(source.read().unwrap(), "<h3>Filter a</h3>");
    }

    #[test]
    fn read_missing_file() {
        let err = Source::File(PathBuf::from("/nonexistent/filters.html"))
            .read()
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to read /nonexistent/filters.html"));
    }
}
