use super::*;
use crate::recurrence::RecurrenceCommands;
use crate::sales::SalesCommands;
use tcgpos_recurrence::RecurrenceType;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["tcgpos-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_recurrence_check_with_unbounded_window() {
    let cli = Cli::try_parse_from([
        "tcgpos-cli",
        "recurrence",
        "check",
        "0 10 * * *",
        "--at",
        "2024-06-03T10:00:00+09:00",
        "--start",
        "2024-06-01T10:00:00+09:00",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Recurrence {
            command: RecurrenceCommands::Check {
                ref expression,
                end: None,
                ..
            }
        }) if expression == "0 10 * * *"
    ));
}

#[test]
fn recurrence_check_rejects_bad_instant() {
    let result = Cli::try_parse_from([
        "tcgpos-cli",
        "recurrence",
        "check",
        "0 10 * * *",
        "--at",
        "yesterday",
        "--start",
        "2024-06-01T10:00:00+09:00",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_recurrence_label_with_end_and_json() {
    let cli = Cli::try_parse_from([
        "tcgpos-cli",
        "recurrence",
        "label",
        "0 0 26 */2 *",
        "--end",
        "2024/12/01",
        "--json",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Recurrence {
            command: RecurrenceCommands::Label {
                end: Some(ref end),
                json: true,
                ..
            }
        }) if end == "2024/12/01"
    ));
}

#[test]
fn parses_recurrence_build_type() {
    let cli = Cli::try_parse_from([
        "tcgpos-cli",
        "recurrence",
        "build",
        "--type",
        "monthly_by_week",
        "--start",
        "2024-06-11T18:30:00+09:00",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Recurrence {
            command: RecurrenceCommands::Build {
                recurrence_type: RecurrenceType::MonthlyByWeek,
                ..
            }
        })
    ));
}

#[test]
fn recurrence_build_rejects_unknown_type() {
    let result = Cli::try_parse_from([
        "tcgpos-cli",
        "recurrence",
        "build",
        "--type",
        "fortnightly",
        "--start",
        "2024-06-11T18:30:00+09:00",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_sales_status_defaults() {
    let cli = Cli::try_parse_from(["tcgpos-cli", "sales", "status"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sales {
            command: SalesCommands::Status {
                at: None,
                path: None
            }
        })
    ));
}

#[test]
fn parses_sales_list_with_path() {
    let cli = Cli::try_parse_from(["tcgpos-cli", "sales", "list", "--path", "fixtures/sales.yaml"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Sales {
            command: SalesCommands::List { path: Some(ref p) }
        }) if p.ends_with("sales.yaml")
    ));
}
