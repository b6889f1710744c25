use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_global_args_after_subcommand() {
    let cli = Cli::try_parse_from(["sf", "render", "--dialect", "mysql", "-p", "proj"]).unwrap();
    assert_eq!(cli.global.dialect.as_deref(), Some("mysql"));
    assert_eq!(cli.global.project_dir, "proj");
    assert!(matches!(cli.command, Commands::Render(_)));
}

#[test]
fn test_migrate_defaults() {
    let cli = Cli::try_parse_from(["sf", "migrate"]).unwrap();
    match cli.command {
        Commands::Migrate(args) => {
            assert!(!args.dry_run);
            assert_eq!(args.output, MigrateOutput::Text);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_log_output_json() {
    let cli = Cli::try_parse_from(["sf", "log", "--output", "json", "--failed"]).unwrap();
    match cli.command {
        Commands::Log(args) => {
            assert_eq!(args.output, LogOutput::Json);
            assert!(args.failed);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_unknown_output_rejected() {
    assert!(Cli::try_parse_from(["sf", "log", "--output", "xml"]).is_err());
}
