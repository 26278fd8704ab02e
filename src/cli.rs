use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::cfg_writer::{compilation_to_header, compilation_to_json, HeaderOptions, DEFAULT_GUARD};
use crate::compiler::compile;
use crate::dbc_import::table_from_dbc;
use crate::signal_table::SignalTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// C header with bitfield unions and the message identifier table.
    #[default]
    Header,
    /// The compiled layout model, diagnostics included.
    Json,
}

impl OutputFormat {
    fn default_file_name(self) -> &'static str {
        match self {
            OutputFormat::Header => "lin_cfg.h",
            OutputFormat::Json => "lin_cfg.json",
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "lincfg",
    about = "Validate a LIN signal table and generate its message layout configuration",
    version
)]
pub struct Cli {
    /// Signal table (CSV, TSV or semicolon separated) or a .dbc database.
    pub input: PathBuf,

    /// Output file. Defaults to lin_cfg.h (or lin_cfg.json) next to the input.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Header)]
    pub format: OutputFormat,

    /// Include guard used in the generated header.
    #[arg(long, default_value = DEFAULT_GUARD)]
    pub guard: String,

    #[arg(
        long,
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    pub log_level: String,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => self.input.with_file_name(self.format.default_file_name()),
        }
    }
}

pub fn run_from_env() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_level = match cli.log_level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        _ => tracing::Level::ERROR,
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let report = run(&cli)?;
    print!("{report}");
    Ok(())
}

/// Load, compile and write; returns the run report.
pub fn run(cli: &Cli) -> anyhow::Result<String> {
    let table = load_table(&cli.input)?;
    let compilation = compile(&table)?;

    let contents = match cli.format {
        OutputFormat::Header => compilation_to_header(
            &compilation,
            &HeaderOptions {
                guard: cli.guard.clone(),
            },
        ),
        OutputFormat::Json => {
            compilation_to_json(&compilation).context("failed to serialize compilation")?
        }
    };

    let output = cli.output_path();
    std::fs::write(&output, contents)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(output = %output.display(), format = ?cli.format, "wrote configuration");

    Ok(compilation.report(&output))
}

fn load_table(input: &Path) -> anyhow::Result<SignalTable> {
    let is_dbc = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dbc"));
    if is_dbc {
        table_from_dbc(input)
    } else {
        SignalTable::from_file(input).with_context(|| format!("failed to load {}", input.display()))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::compiler::CompileError;

    fn cli(input: PathBuf) -> Cli {
        Cli {
            input,
            output: None,
            format: OutputFormat::Header,
            guard: DEFAULT_GUARD.to_string(),
            log_level: "warn".to_string(),
        }
    }

    #[test]
    fn test_parses_arguments() {
        let cli =
            Cli::try_parse_from(["lincfg", "signals.csv", "--format", "json", "-o", "out.json"])
                .unwrap();
        assert_eq!(cli.input, PathBuf::from("signals.csv"));
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.output_path(), PathBuf::from("out.json"));
        assert_eq!(cli.guard, DEFAULT_GUARD);
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_log_level_must_be_known() {
        let cli = Cli::try_parse_from(["lincfg", "signals.csv", "--log-level", "debug"]).unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(Cli::try_parse_from(["lincfg", "signals.csv", "--log-level", "verbose"]).is_err());
    }

    #[test]
    fn test_default_output_sits_next_to_input() {
        let mut args = cli(PathBuf::from("tables/body.csv"));
        assert_eq!(args.output_path(), PathBuf::from("tables/lin_cfg.h"));
        args.format = OutputFormat::Json;
        assert_eq!(args.output_path(), PathBuf::from("tables/lin_cfg.json"));
    }

    #[test]
    fn test_run_writes_header_and_reports() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("signals.csv");
        std::fs::write(
            &input,
            "PID,PIDname,SignalName,StartBit,Length,DefaultValue\n\
             0x10,MSG_A,Flag,0,1,1\n\
             0x10,MSG_A,Mode,1,2,9\n",
        )
        .unwrap();

        let report = run(&cli(input)).unwrap();
        let output = dir.path().join("lin_cfg.h");
        let notice = format!("Generated LIN configuration: {}\n", output.display());
        assert!(report.starts_with(&notice));
        assert!(report.contains("===== warnings =====\nrow 3: default value 9 is out of range"));

        let header = std::fs::read_to_string(output).unwrap();
        assert!(header.contains("} MSG_A_MSG_t; /* init_DefaultValue = {0xFB,"));
    }

    #[test]
    fn test_run_writes_json() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("signals.tsv");
        std::fs::write(
            &input,
            "PID\tPIDname\tSignalName\tStartBit\tEndBit\n0x20\tMSG_B\tSpeed\t0\t15\n",
        )
        .unwrap();
        let mut args = cli(input);
        args.format = OutputFormat::Json;
        args.output = Some(dir.path().join("layout.json"));
        run(&args).unwrap();

        let json = std::fs::read_to_string(dir.path().join("layout.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["layouts"][0]["id"], 0x20);
    }

    #[test]
    fn test_empty_table_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("signals.csv");
        std::fs::write(&input, "PID,PIDname,SignalName,StartBit,Length\n").unwrap();
        let err = run(&cli(input)).unwrap_err();
        assert!(matches!(err.downcast_ref::<CompileError>(), Some(CompileError::NoSignalsFound)));
        assert!(!dir.path().join("lin_cfg.h").exists());
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempdir().unwrap();
        let err = run(&cli(dir.path().join("absent.csv"))).unwrap_err();
        assert!(format!("{err:#}").contains("absent.csv"));
    }
}
