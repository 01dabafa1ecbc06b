//! Error types for the pencil_palette library

use thiserror::Error;

/// Result type alias for pencil_palette operations
pub type Result<T> = std::result::Result<T, PaletteError>;

/// Error taxonomy for palette extraction, matching and export
#[derive(Error, Debug)]
pub enum PaletteError {
    /// Input image is empty, malformed or has an unsupported channel layout
    #[error("Invalid image: {reason}")]
    InvalidImage { reason: String },

    /// Image bytes or file could not be decoded
    #[error("Failed to load image: {message}")]
    ImageLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Pencil catalog is empty or failed to load; fatal at startup
    #[error("Pencil catalog unavailable: {reason}")]
    EmptyCatalog { reason: String },

    /// Catalog data could not be read or parsed
    #[error("Failed to load pencil catalog: {message}")]
    CatalogLoadError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Brand name not present in the catalog
    #[error("Unknown pencil brand: {brand}")]
    UnknownBrand { brand: String },

    /// Export format tag not recognized
    #[error("Unsupported export format: {format}")]
    UnsupportedFormat { format: String },

    /// Rendering an export document failed
    #[error("Export failed: {message}")]
    ExportError { message: String },

    /// Session history could not be read or written
    #[error("History store error: {message}")]
    HistoryError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration file could not be read, parsed or written
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },
}

impl PaletteError {
    /// Create an invalid image error
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    /// Create an image load error with context
    pub fn image_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ImageLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a catalog load error with context
    pub fn catalog_load<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::CatalogLoadError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a history store error with context
    pub fn history<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::HistoryError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error is scoped to a single request.
    ///
    /// Catalog failures are startup misconfiguration and abort the process;
    /// everything else aborts only the request that raised it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PaletteError::InvalidImage { .. }
                | PaletteError::ImageLoadError { .. }
                | PaletteError::UnknownBrand { .. }
                | PaletteError::UnsupportedFormat { .. }
                | PaletteError::InvalidParameter { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            PaletteError::InvalidImage { .. } | PaletteError::ImageLoadError { .. } => {
                "Could not read the image. Please upload a non-empty PNG or JPEG file.".to_string()
            }
            PaletteError::UnknownBrand { brand } => {
                format!("No pencils are available for the brand \"{}\".", brand)
            }
            PaletteError::UnsupportedFormat { format } => {
                format!("\"{}\" is not a supported export format.", format)
            }
            PaletteError::InvalidParameter { parameter, .. } => {
                format!("The setting \"{}\" has an invalid value.", parameter)
            }
            _ => "Palette analysis is unavailable. Please try again later.".to_string(),
        }
    }
}
