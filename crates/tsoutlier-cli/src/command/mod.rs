use clap::{Parser, Subcommand};

use self::{describe::DescribeArg, generate::GenerateArg, iqr::IqrArg, zscore::ZScoreArg};

mod describe;
mod generate;
mod iqr;
mod shared;
mod zscore;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Print a summary of a dataset
    Describe(#[clap(flatten)] DescribeArg),
    /// Flag outliers with interquartile range fences
    Iqr(#[clap(flatten)] IqrArg),
    /// Flag outliers with z-score thresholding
    #[command(name = "zscore")]
    ZScore(#[clap(flatten)] ZScoreArg),
    /// Generate a synthetic dataset with injected outliers
    Generate(#[clap(flatten)] GenerateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Describe(arg) => describe::run(&arg)?,
        Mode::Iqr(arg) => iqr::run(&arg)?,
        Mode::ZScore(arg) => zscore::run(&arg)?,
        Mode::Generate(arg) => generate::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory as _;

    use super::*;

    #[test]
    fn test_command_definition() {
        CommandArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_iqr_arguments() {
        let args = CommandArgs::try_parse_from([
            "tsoutlier",
            "iqr",
            "data.csv",
            "--q1",
            "0.1",
            "--top",
            "--series",
            "1,3,5",
        ])
        .unwrap();
        let Mode::Iqr(arg) = args.mode else {
            panic!("expected iqr subcommand");
        };
        let params = arg.params();
        assert!((params.q1 - 0.1).abs() < f64::EPSILON);
        assert!((params.q3 - 0.75).abs() < f64::EPSILON);
        assert!(params.top);
        assert_eq!(arg.dataset.series, vec![1, 3, 5]);
    }

    #[test]
    fn test_parse_zscore_arguments() {
        let args =
            CommandArgs::try_parse_from(["tsoutlier", "zscore", "data.csv", "--fail-on-degenerate"])
                .unwrap();
        let Mode::ZScore(arg) = args.mode else {
            panic!("expected zscore subcommand");
        };
        let params = arg.params();
        assert!((params.std - 3.0).abs() < f64::EPSILON);
        assert!(params.on_degenerate.is_fail());
    }

    #[test]
    fn test_missing_data_argument_is_rejected() {
        assert!(CommandArgs::try_parse_from(["tsoutlier", "iqr"]).is_err());
    }
}
