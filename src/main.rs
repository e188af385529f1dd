use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use diet_plan_pdf::AssetConfig;

#[derive(Parser)]
#[command(name = "diet-plan-pdf", version, about = "Lay out diet plans as PDF")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one plan JSON file to a PDF
    Render {
        input: PathBuf,
        #[arg(short, long, default_value = "diet-plan.pdf")]
        output: PathBuf,
        #[command(flatten)]
        assets: AssetArgs,
    },
    /// Serve POST /api/diet-pdf
    #[cfg(feature = "server")]
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        #[command(flatten)]
        assets: AssetArgs,
    },
}

#[derive(Args)]
struct AssetArgs {
    /// Directory holding logo.png / logo.jpg and fonts/Inter-Regular.ttf
    #[arg(long, default_value = "public")]
    public_dir: PathBuf,
    #[arg(long)]
    logo: Option<PathBuf>,
    #[arg(long)]
    font: Option<PathBuf>,
}

impl AssetArgs {
    fn config(self) -> AssetConfig {
        AssetConfig::discover(&self.public_dir)
            .with_env_overrides()
            .with_overrides(self.logo, self.font)
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Command::Render {
            input,
            output,
            assets,
        } => {
            diet_plan_pdf::convert_plan_json_to_pdf(&input, &output, &assets.config())?;
            println!("Wrote {}", output.display());
        }
        #[cfg(feature = "server")]
        Command::Serve { port, assets } => {
            let assets = diet_plan_pdf::Assets::load(&assets.config());
            let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
            tokio::runtime::Runtime::new()?
                .block_on(diet_plan_pdf::server::serve(addr, assets))?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
