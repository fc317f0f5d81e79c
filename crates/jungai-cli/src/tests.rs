use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["jungai-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn analyze_defaults_to_all_brands() {
    let cli = Cli::try_parse_from(["jungai-cli", "analyze"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Analyze {
            ref brands,
            strict: false,
            dry_run: false
        }) if brands.is_empty()
    ));
}

#[test]
fn analyze_accepts_repeated_brands_and_flags() {
    let cli = Cli::try_parse_from([
        "jungai-cli",
        "analyze",
        "--brand",
        "AcmeCorp",
        "--brand",
        "Globex",
        "--strict",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Analyze {
            ref brands,
            strict: true,
            dry_run: true
        }) if brands == &["AcmeCorp".to_string(), "Globex".to_string()]
    ));
}

#[test]
fn classify_requires_text_or_file() {
    assert!(Cli::try_parse_from(["jungai-cli", "classify"]).is_err());
}

#[test]
fn classify_rejects_text_and_file_together() {
    let result = Cli::try_parse_from([
        "jungai-cli",
        "classify",
        "--text",
        "hello",
        "--file",
        "notes.txt",
    ]);
    assert!(result.is_err());
}

#[test]
fn classify_with_text_defaults_brand() {
    let cli = Cli::try_parse_from(["jungai-cli", "classify", "--text", "We care."]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Classify {
            text: Some(ref t),
            file: None,
            ref brand,
        }) if t == "We care." && brand == "ad-hoc"
    ));
}

#[test]
fn report_defaults() {
    let cli = Cli::try_parse_from(["jungai-cli", "report"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            brand: None,
            limit: 20,
            markdown: false
        })
    ));
}

#[test]
fn report_with_filter_limit_and_markdown() {
    let cli = Cli::try_parse_from([
        "jungai-cli",
        "report",
        "--brand",
        "acme-corp",
        "--limit",
        "5",
        "--markdown",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Report {
            brand: Some(ref b),
            limit: 5,
            markdown: true
        }) if b == "acme-corp"
    ));
}

mod resolve {
    use jungai_core::{BrandConfig, BrandsFile};

    use crate::analyze::resolve_brands;

    fn configured() -> BrandsFile {
        BrandsFile {
            brands: vec![
                BrandConfig {
                    name: "Acme Corp".to_string(),
                    aliases: vec!["Acme".to_string()],
                    domains: vec!["acme.example".to_string()],
                },
                BrandConfig {
                    name: "Globex".to_string(),
                    aliases: Vec::new(),
                    domains: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn empty_request_uses_every_configured_brand() {
        let brands = resolve_brands(&[], Some(&configured())).unwrap();
        let names: Vec<&str> = brands.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["Acme Corp", "Globex"]);
    }

    #[test]
    fn empty_request_without_config_is_an_error() {
        assert!(resolve_brands(&[], None).is_err());
    }

    #[test]
    fn configured_brand_is_matched_by_slug() {
        let brands = resolve_brands(&["acme-corp".to_string()], Some(&configured())).unwrap();
        assert_eq!(brands.len(), 1);
        assert_eq!(brands[0].name(), "Acme Corp");
        assert_eq!(brands[0].aliases(), ["Acme".to_string()]);
        assert_eq!(brands[0].domains(), ["acme.example".to_string()]);
    }

    #[test]
    fn unknown_brand_runs_with_bare_name() {
        let brands = resolve_brands(&["Initech".to_string()], Some(&configured())).unwrap();
        assert_eq!(brands[0].name(), "Initech");
        assert!(brands[0].aliases().is_empty());
    }

    #[test]
    fn duplicate_requests_collapse() {
        let requested = ["Globex".to_string(), "globex".to_string()];
        let brands = resolve_brands(&requested, None).unwrap();
        assert_eq!(brands.len(), 1);
    }
}
