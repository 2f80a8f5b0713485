use super::config::StandingsConfig;

/// Validate standings configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_standings(config: &StandingsConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (name, value) in [
        ("performance_weight", config.performance_weight),
        ("spirit_weight", config.spirit_weight),
    ] {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("standings.{}: must be a non-negative number, got {}", name, value));
        }
    }

    if errors.is_empty() && config.performance_weight + config.spirit_weight == 0.0 {
        errors.push("standings: performance_weight and spirit_weight cannot both be 0".to_string());
    }

    if !config.max_spirit_total.is_finite() || config.max_spirit_total <= 0.0 {
        errors.push(format!(
            "standings.max_spirit_total: must be greater than 0, got {}",
            config.max_spirit_total
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        assert!(validate_standings(&StandingsConfig::default()).is_ok());
    }

    #[test]
    fn test_negative_weight() {
        let config = StandingsConfig {
            spirit_weight: -5.0,
            ..StandingsConfig::default()
        };
        let errors = validate_standings(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("standings.spirit_weight"));
    }

    #[test]
    fn test_zero_weights() {
        let config = StandingsConfig {
            performance_weight: 0.0,
            spirit_weight: 0.0,
            ..StandingsConfig::default()
        };
        let errors = validate_standings(&config).unwrap_err();
        assert!(errors[0].contains("cannot both be 0"));
    }

    #[test]
    fn test_collects_all_errors() {
        let config = StandingsConfig {
            performance_weight: f64::NAN,
            spirit_weight: -1.0,
            max_spirit_total: 0.0,
            ..StandingsConfig::default()
        };
        let errors = validate_standings(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
