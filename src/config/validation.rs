use crate::config::types::{
    Config, CrawlerConfig, InputConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site section
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(
            "page_size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch_size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.max_empty_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_empty_pages must be >= 1, got {}",
            config.max_empty_pages
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.metadata_path.is_empty() {
        return Err(ConfigError::Validation(
            "metadata_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(base_url: &str, page_size: u32) -> SiteConfig {
        SiteConfig {
            base_url: base_url.to_string(),
            page_size,
        }
    }

    #[test]
    fn test_validate_site_config() {
        assert!(validate_site_config(&site("https://www.yellowpages.vn/", 45)).is_ok());
        assert!(validate_site_config(&site("http://127.0.0.1:8080/", 1)).is_ok());

        assert!(validate_site_config(&site("not a url", 45)).is_err());
        assert!(validate_site_config(&site("ftp://yellowpages.vn/", 45)).is_err());
        assert!(validate_site_config(&site("https://www.yellowpages.vn/", 0)).is_err());
    }

    #[test]
    fn test_validate_crawler_config() {
        assert!(validate_crawler_config(&CrawlerConfig::default()).is_ok());

        let zero_empty = CrawlerConfig {
            max_empty_pages: 0,
            ..CrawlerConfig::default()
        };
        assert!(validate_crawler_config(&zero_empty).is_err());

        let slow = CrawlerConfig {
            request_timeout_secs: 301,
            ..CrawlerConfig::default()
        };
        assert!(validate_crawler_config(&slow).is_err());

        // Probing ahead can be switched off entirely
        let no_probe = CrawlerConfig {
            probe_ahead_pages: 0,
            ..CrawlerConfig::default()
        };
        assert!(validate_crawler_config(&no_probe).is_ok());
    }

    #[test]
    fn test_validate_user_agent() {
        assert!(validate_user_agent_config(&UserAgentConfig {
            value: "Mozilla/5.0".to_string()
        })
        .is_ok());
        assert!(validate_user_agent_config(&UserAgentConfig {
            value: "   ".to_string()
        })
        .is_err());
    }

    #[test]
    fn test_validate_output_paths() {
        let empty_db = OutputConfig {
            database_path: String::new(),
            export_dir: "out".to_string(),
        };
        assert!(validate_output_config(&empty_db).is_err());

        let empty_export = OutputConfig {
            database_path: "yp.db".to_string(),
            export_dir: String::new(),
        };
        assert!(validate_output_config(&empty_export).is_err());
    }
}
