use crate::compression_backend::{DEFAULT_QUALITY, DEFAULT_WINDOW};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionLevel {
    Fast,
    #[default]
    Default,
    Best,
}

impl CompressionLevel {
    /// Brotli quality and window size (log2) for this level
    pub fn params(&self) -> (i32, i32) {
        match self {
            CompressionLevel::Fast => (3, 20),
            CompressionLevel::Default => (DEFAULT_QUALITY, DEFAULT_WINDOW),
            CompressionLevel::Best => (11, 24),
        }
    }
}

impl Display for CompressionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Default => write!(f, "default"),
            Self::Best => write!(f, "best"),
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(CompressionLevel::Fast),
            "default" => Ok(CompressionLevel::Default),
            "best" => Ok(CompressionLevel::Best),
            _ => Err(format!("Unsupported compression level: {}", s)),
        }
    }
}

/// How content directories are scanned for descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReadMode {
    /// Only the given directory
    #[default]
    Flat,
    /// The given directory and every nested subdirectory
    Recursive,
}

#[derive(Debug, Clone, Default)]
pub struct PackConfig {
    pub compression_level: CompressionLevel,
    pub read_mode: ReadMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_names() {
        for level in [
            CompressionLevel::Fast,
            CompressionLevel::Default,
            CompressionLevel::Best,
        ] {
            assert_eq!(level.to_string().parse::<CompressionLevel>(), Ok(level));
        }
        assert!("ultra".parse::<CompressionLevel>().is_err());
    }

    #[test]
    fn test_default_level_matches_codec_defaults() {
        assert_eq!(CompressionLevel::default().params(), (11, 22));
    }
}
