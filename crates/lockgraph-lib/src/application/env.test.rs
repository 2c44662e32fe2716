use super::*;

fn env(vars: &[(&str, &str)]) -> EnvironmentConfig {
    EnvironmentConfig::from_vars(
        vars.iter()
            .map(|(key, value)| (key.to_string(), value.to_string())),
    )
    .unwrap()
}

#[test]
fn test_no_color_environment_variable() {
    let color = env(&[("NO_COLOR", "1")]).apply_color_config(ColorIntent::Auto);
    assert_eq!(color, ColorIntent::Never);
}

#[test]
fn test_force_color_environment_variable() {
    let color = env(&[("FORCE_COLOR", "1")]).apply_color_config(ColorIntent::Auto);
    assert_eq!(color, ColorIntent::Always);
}

#[test]
fn test_environment_variable_precedence() {
    let config = env(&[("CLICOLOR", "0"), ("NO_COLOR", "1"), ("FORCE_COLOR", "1")]);

    // FORCE_COLOR=1 wins over NO_COLOR and CLICOLOR
    assert_eq!(
        config.apply_color_config(ColorIntent::Auto),
        ColorIntent::Always
    );
}

#[test]
fn test_ci_environment_variable() {
    let config = env(&[("CI", "true"), ("FORCE_COLOR", "1")]);
    assert_eq!(
        config.apply_color_config(ColorIntent::Always),
        ColorIntent::Never
    );
}

#[test]
fn test_empty_no_color_is_ignored() {
    let color = env(&[("NO_COLOR", "")]).apply_color_config(ColorIntent::Auto);
    assert_eq!(color, ColorIntent::Auto);
}

#[test]
fn test_invalid_force_color_values_ignored() {
    let color = env(&[("FORCE_COLOR", "invalid")]).apply_color_config(ColorIntent::Auto);
    assert_eq!(color, ColorIntent::Auto);
}

#[test]
fn test_unrelated_variables_are_ignored() {
    let config = env(&[("PATH", "/usr/bin"), ("HOME", "/root")]);
    assert!(config.no_color.is_none());
    assert_eq!(config.apply_color_config(ColorIntent::Never), ColorIntent::Never);
}
