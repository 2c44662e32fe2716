use super::*;

macro_rules! test_enum_completeness {
    ($enum_type:ty, $test_name:ident) => {
        #[test]
        fn $test_name() {
            for variant in <$enum_type>::value_variants() {
                let possible_value = variant
                    .to_possible_value()
                    .expect("PossibleValue should exist for all variants");

                let primary_name = possible_value.get_name();
                let parsed: $enum_type = primary_name
                    .parse()
                    .unwrap_or_else(|_| panic!("'{}' should parse", primary_name));
                assert_eq!(parsed, *variant, "Round-trip should preserve variant");
            }
        }
    };
}

macro_rules! test_fromstr_aliases {
    ($enum_type:ty, $test_name:ident, $expected_mappings:expr) => {
        #[test]
        fn $test_name() {
            let mappings: &[(&str, $enum_type)] = &$expected_mappings;

            for (input, expected) in mappings {
                let parsed: Result<$enum_type, _> = input.parse();
                assert_eq!(
                    parsed.ok(),
                    Some(*expected),
                    "Wrong variant for input '{}'",
                    input
                );
            }
        }
    };
}

test_enum_completeness!(LogLevel, test_log_level_completeness);
test_enum_completeness!(LogFormat, test_log_format_completeness);
test_enum_completeness!(LogOutput, test_log_output_completeness);
test_enum_completeness!(ColorIntent, test_color_intent_completeness);
test_enum_completeness!(OutputFormat, test_output_format_completeness);

test_fromstr_aliases!(
    LogLevel,
    test_log_level_aliases,
    [
        ("error", LogLevel::Error),
        ("err", LogLevel::Error),
        ("warn", LogLevel::Warning),
        ("warning", LogLevel::Warning),
        ("info", LogLevel::Info),
        ("debug", LogLevel::Debug),
        ("trace", LogLevel::Trace),
        ("verbose", LogLevel::Trace),
        ("TRACE", LogLevel::Trace),
    ]
);

test_fromstr_aliases!(
    LogFormat,
    test_log_format_aliases,
    [
        ("text", LogFormat::Text),
        ("plain", LogFormat::Text),
        ("json", LogFormat::Json),
        ("pretty", LogFormat::Pretty),
        ("full", LogFormat::Pretty),
    ]
);

test_fromstr_aliases!(
    ColorIntent,
    test_color_intent_aliases,
    [
        ("auto", ColorIntent::Auto),
        ("detect", ColorIntent::Auto),
        ("always", ColorIntent::Always),
        ("on", ColorIntent::Always),
        ("never", ColorIntent::Never),
        ("off", ColorIntent::Never),
    ]
);

test_fromstr_aliases!(
    OutputFormat,
    test_output_format_aliases,
    [
        ("json", OutputFormat::Json),
        ("json-compact", OutputFormat::JsonCompact),
        ("compact", OutputFormat::JsonCompact),
    ]
);

#[test]
fn test_invalid_value_reports_parse_error() {
    let err = "purple".parse::<ColorIntent>().unwrap_err();
    match err {
        ConfigError::ParseError { value, reason } => {
            assert_eq!(value, "purple");
            assert_eq!(reason, "invalid color intent");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_log_level_from_verbosity_boundary_conditions() {
    assert_eq!(LogLevel::from_verbosity(0), LogLevel::Error);
    assert_eq!(LogLevel::from_verbosity(1), LogLevel::Warning);
    assert_eq!(LogLevel::from_verbosity(2), LogLevel::Info);
    assert_eq!(LogLevel::from_verbosity(3), LogLevel::Debug);
    assert_eq!(LogLevel::from_verbosity(4), LogLevel::Trace);
    assert_eq!(LogLevel::from_verbosity(u8::MAX), LogLevel::Trace);
}

#[test]
fn test_color_intent_resolution() {
    assert!(ColorIntent::Auto.enabled(true));
    assert!(!ColorIntent::Auto.enabled(false));
    assert!(ColorIntent::Always.enabled(false));
    assert!(!ColorIntent::Never.enabled(true));
}

#[test]
fn test_log_context_progress() {
    let mut context = LogContext::with_progress("resolve", 12);
    assert_eq!(context.total_items, Some(12));
    assert_eq!(context.current_item, None);

    context.set_progress(5);
    assert_eq!(context.current_item, Some(5));
}
