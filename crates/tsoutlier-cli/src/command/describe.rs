use super::shared::DatasetArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DescribeArg {
    #[clap(flatten)]
    dataset: DatasetArg,
}

pub(crate) fn run(arg: &DescribeArg) -> anyhow::Result<()> {
    let dataset = arg.dataset.load()?;
    print!("{dataset}");
    Ok(())
}
