//! Script-driving entry point: read a JSON directive script from a path
//! argument or stdin, run it, and print the run report as one JSON line.
//! Exits non-zero when any case failed.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::io::{self, AsyncReadExt};

use wast_harness::{run_script, Harness, Runner, Script};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    {
        use tracing_subscriber::{fmt, EnvFilter};
        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let mut script_path: Option<PathBuf> = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--script" => {
                let path = args.next().context("--script requires a value")?;
                script_path = Some(PathBuf::from(path));
            }
            flag if flag.starts_with('-') => bail!("unknown flag: {flag}"),
            path if script_path.is_none() => script_path = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument: {extra}"),
        }
    }

    let script = match script_path {
        Some(path) => Script::from_path(&path)?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .await
                .context("read script from stdin")?;
            Script::from_json(&text)?
        }
    };

    let mut harness = Harness::new().await?;
    let mut runner = Runner::new(script.suite.clone());
    run_script(&mut harness, &mut runner, &script).await?;

    let report = runner.report();
    println!("{}", serde_json::to_string(&report)?);

    if report.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}
