mod args;

use std::{process::ExitCode, time::Instant};

use ansi_term::Colour;
use args::{ComponentArgs, EnhanceArgs, InputArgs, OutputArgs};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use porter::{BuildError, CompileError, ModuleId, OutputAsset, Packer, PackerOptions};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Commands {
  #[command(subcommand)]
  command: Command,

  #[clap(flatten)]
  enhance: EnhanceArgs,
}

#[derive(Subcommand)]
enum Command {
  /// Compile every installed package and every source file of the search paths.
  CompileAll {
    /// Glob selecting the files compiled as full components, e.g. `**/*.page.js`.
    #[clap(long = "match")]
    match_pattern: String,

    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    output: OutputArgs,

    #[clap(flatten)]
    component: ComponentArgs,
  },
  /// Compile one entry of the first search path into a self-contained component.
  CompileComponent {
    entry: String,

    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    output: OutputArgs,

    #[clap(flatten)]
    component: ComponentArgs,
  },
  /// Compile one package module, `--paths` being the directory it is installed in.
  CompileModule {
    #[clap(long)]
    id: String,

    #[clap(flatten)]
    input: InputArgs,

    #[clap(flatten)]
    output: OutputArgs,
  },
}

fn packer_options(
  input: InputArgs,
  output: OutputArgs,
  component: Option<ComponentArgs>,
) -> PackerOptions {
  let component = component.unwrap_or_default();
  PackerOptions {
    root: input.root,
    paths: input.paths,
    match_pattern: None,
    dest: output.dest,
    source_root: output.source_root,
    include_modules: Some(!component.exclude_modules),
    cache: Some(output.cache),
    precompile: Some(component.precompile),
    worker: component.worker,
  }
}

fn print_output_assets(outputs: Vec<OutputAsset>) {
  let mut left = 0;
  let mut right = 0;

  let mut assets = Vec::with_capacity(outputs.len());

  for output in outputs {
    let size = format!("{:.2}", output.content.len() as f64 / 1024.0);

    if size.len() > right {
      right = size.len();
    }

    if output.filename.len() > left {
      left = output.filename.len()
    }

    assets.push((output.filename, size, output.kind.as_str()));
  }

  let dim = Colour::White.dimmed();
  let color = Colour::Cyan;

  for (filename, size, kind) in assets {
    let filename_len = filename.len();

    println!(
      "{}{}{:left$} {}{}{:right$}{} kB",
      dim.paint("<DEST>/"),
      color.paint(filename),
      "",
      dim.paint(format!("{kind:9}")),
      dim.paint(" │ size: "),
      "",
      size,
      left = left - filename_len,
      right = right - size.len()
    )
  }
}

fn print_errors(errors: &BuildError) {
  for error in &**errors {
    eprintln!("{} {:#}", Colour::Red.paint("Error:"), error);
  }
}

async fn run(command: Command, silent: bool) -> Result<(), BuildError> {
  let (packer, assets, warnings) = match command {
    Command::CompileAll { match_pattern, input, output, component } => {
      let options = PackerOptions {
        match_pattern: Some(match_pattern),
        ..packer_options(input, output, Some(component))
      };
      let packer = Packer::new(options)?;
      let output = packer.compile_all()?;
      (packer, output.assets, output.warnings)
    }
    Command::CompileComponent { entry, input, output, component } => {
      let packer = Packer::new(packer_options(input, output, Some(component)))?;
      let project = packer.resolve_project()?;
      let asset = packer.compile_component(&entry, Some(&project.dependencies))?;
      (packer, vec![asset], vec![])
    }
    Command::CompileModule { id, input, output } => {
      let packer = Packer::new(packer_options(input, output, None))?;
      let Some(module_id) = ModuleId::parse(&id) else {
        let message = format!("`{id}` is not a `<name>/<version>/<entry>` module id");
        return Err(CompileError::Configuration(message).into());
      };
      let path = packer.options().primary_path();
      let asset = packer.compile_module(&module_id, &path, None)?;
      (packer, vec![asset], vec![])
    }
  };

  if !silent {
    for warning in warnings {
      println!("{} {}", Colour::Yellow.paint("Warning:"), warning);
    }

    if !assets.is_empty() {
      print_output_assets(assets);
    }
  }

  if let Some(scheduler) = packer.scheduler() {
    if scheduler.pending() > 0 {
      tracing::info!("Waiting for {} background jobs", scheduler.pending());
    }
    scheduler.idle().await;
  }

  Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
    .with_writer(std::io::stderr)
    .init();

  let args = Commands::parse();

  let start = Instant::now();
  match run(args.command, args.enhance.silent).await {
    Ok(()) => {
      let elapsed = format!("{:.2} ms", start.elapsed().as_secs_f64() * 1000.0);
      if !args.enhance.silent {
        let elapsed = Colour::White.bold().paint(elapsed);
        println!("\n{} Finished in {}", Colour::Green.paint("✔"), elapsed);
      }
      ExitCode::SUCCESS
    }
    Err(errors) => {
      print_errors(&errors);
      ExitCode::FAILURE
    }
  }
}
