//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::output::OutputFormat;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.workers must be > 0".into(),
            ));
        }
        if self.processing.num_tasks == 0 {
            return Err(ConfigError::ValidationError(
                "processing.num_tasks must be > 0".into(),
            ));
        }
        if self.processing.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "processing.supported_formats must not be empty".into(),
            ));
        }
        if self.pipeline.task_buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.task_buffer_size must be > 0".into(),
            ));
        }
        if self.pipeline.result_buffer_size == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.result_buffer_size must be > 0".into(),
            ));
        }
        if !self.transform.blur_radius.is_finite() || self.transform.blur_radius <= 0.0 {
            return Err(ConfigError::ValidationError(
                "transform.blur_radius must be a positive number".into(),
            ));
        }
        if OutputFormat::parse(&self.output.format).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be text, json or jsonl (got {:?})",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.processing.workers = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("processing.workers"));
    }

    #[test]
    fn test_validate_rejects_zero_tasks() {
        let mut config = Config::default();
        config.processing.num_tasks = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("num_tasks"));
    }

    #[test]
    fn test_validate_rejects_zero_buffers() {
        let mut config = Config::default();
        config.pipeline.result_buffer_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("result_buffer_size"));
    }

    #[test]
    fn test_validate_rejects_bad_blur_radius() {
        let mut config = Config::default();
        config.transform.blur_radius = -1.0;
        assert!(config.validate().is_err());

        config.transform.blur_radius = f32::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("blur_radius"));
    }

    #[test]
    fn test_validate_rejects_unknown_output_format() {
        let mut config = Config::default();
        config.output.format = "xml".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output.format"));
    }
}
