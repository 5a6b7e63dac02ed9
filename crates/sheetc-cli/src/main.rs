//! sheetc CLI - compile spreadsheet formulas into Rust source

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetc::prelude::*;
use sheetc::ClassKind;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheetc")]
#[command(author, version, about = "Compile spreadsheet formulas into Rust source")]
struct Cli {
    /// Log pipeline progress (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Rust source for a sheet and write it to stdout or a file
    #[command(alias = "gen")]
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Output Rust file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Wrap the generated code in `pub mod <NAME>`
        #[arg(short, long)]
        module: Option<String>,

        /// Path the generated code imports the runtime from
        #[arg(long, default_value = "sheetc_runtime")]
        runtime_crate: String,

        /// Leave out the formula comments above each statement
        #[arg(long)]
        no_comments: bool,
    },

    /// Show the classes the sheet is partitioned into
    Graph {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show information about the loaded workbook
    Info {
        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Input CSV file; the sheet is named after the file
    input: PathBuf,

    /// Additional sheet for cross-sheet references, as NAME=PATH
    #[arg(short = 'x', long = "extra", value_name = "NAME=PATH")]
    extra: Vec<String>,

    /// Generate only these cells and what they depend on
    #[arg(short = 'c', long = "cell", value_name = "CELL")]
    cells: Vec<String>,

    /// Field delimiter (default: comma)
    #[arg(short, long, default_value = ",")]
    delimiter: char,

    /// Treat the first row as text headers
    #[arg(long)]
    header: bool,

    /// Accept comma decimal separators in formulas (`=A1*1,5`)
    #[arg(long)]
    comma_decimals: bool,
}

impl InputArgs {
    fn read_options(&self) -> Result<CsvReadOptions> {
        if !self.delimiter.is_ascii() {
            bail!("Delimiter '{}' is not an ASCII character", self.delimiter);
        }
        Ok(CsvReadOptions::new()
            .with_delimiter(self.delimiter as u8)
            .with_header(self.header))
    }

    fn load(&self) -> Result<Workbook> {
        let options = self.read_options()?;
        let mut workbook = Workbook::open(&self.input, &options)
            .with_context(|| format!("Failed to open '{}'", self.input.display()))?;

        for extra in &self.extra {
            let (name, path) = parse_extra(extra)?;
            workbook
                .attach_csv(name, path, &options)
                .with_context(|| format!("Failed to attach '{}' as sheet '{}'", path, name))?;
        }
        Ok(workbook)
    }

    fn generate_options(&self) -> Result<GenerateOptions> {
        let mut options = GenerateOptions::new().with_locale_normalization(self.comma_decimals);
        if !self.cells.is_empty() {
            let outputs = self
                .cells
                .iter()
                .map(|cell| {
                    CellAddress::parse(cell)
                        .with_context(|| format!("Invalid cell address '{}'", cell))
                })
                .collect::<Result<Vec<_>>>()?;
            options = options.with_outputs(outputs);
        }
        Ok(options)
    }
}

fn parse_extra(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name, path)),
        _ => bail!("Expected NAME=PATH for --extra, got '{}'", arg),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            input,
            output,
            module,
            runtime_crate,
            no_comments,
        } => {
            let mut codegen = CodegenOptions::new()
                .with_runtime_crate(runtime_crate)
                .with_comments(!no_comments);
            if let Some(module) = module {
                codegen = codegen.with_module(module);
            }
            generate_source(&input, output.as_deref(), codegen)
        }
        Commands::Graph { input } => show_graph(&input),
        Commands::Info { input } => show_info(&input),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(input: &InputArgs, codegen: CodegenOptions) -> Result<Generation> {
    let workbook = input.load()?;
    let options = input.generate_options()?.with_codegen(codegen);
    let generation = workbook
        .generate(&options)
        .with_context(|| format!("Failed to generate code for '{}'", input.input.display()))?;

    for diagnostic in generation.diagnostics.iter() {
        eprintln!("{}", diagnostic);
    }
    Ok(generation)
}

fn generate_source(input: &InputArgs, output: Option<&Path>, codegen: CodegenOptions) -> Result<()> {
    let generation = run(input, codegen)?;
    let stats = &generation.stats;

    if let Some(output_path) = output {
        std::fs::write(output_path, &generation.source)
            .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
        eprintln!(
            "Wrote {} classes ({} statements) to '{}'",
            stats.classes,
            stats.statements,
            output_path.display()
        );
    } else {
        io::stdout()
            .write_all(generation.source.as_bytes())
            .context("Failed to write to stdout")?;
    }

    if stats.placeholders > 0 {
        eprintln!(
            "{} statements contain placeholders and need manual completion",
            stats.placeholders
        );
    }
    Ok(())
}

fn show_graph(input: &InputArgs) -> Result<()> {
    let generation = run(input, CodegenOptions::default())?;
    let graph = &generation.graph;

    for class in generation.partition.iter() {
        let kind = match class.kind {
            ClassKind::Output => "output",
            ClassKind::Global => "shared",
            ClassKind::External => "external",
        };
        println!("{} ({}, {} cells)", class.name, kind, class.len());
        if class.has_cycle() {
            println!("  cycle through {} cells", class.cyclic.len());
        }
        for id in &class.vertices {
            let vertex = graph.vertex(*id);
            let variable = vertex.variable_name().unwrap_or("-");
            match vertex.formula() {
                Some(formula) => println!(
                    "  {}\t{}\t{}\t{}",
                    vertex.label(),
                    variable,
                    vertex.cell_type(),
                    formula
                ),
                None => println!("  {}\t{}\t{}", vertex.label(), variable, vertex.cell_type()),
            }
        }
    }
    Ok(())
}

fn show_info(input: &InputArgs) -> Result<()> {
    let workbook = input.load()?;

    println!("File: {}", input.input.display());
    println!("Sheets: {}", workbook.sheet_count());

    for (i, sheet) in workbook.worksheets().enumerate() {
        let formula_count = sheet.formula_cells().count();
        let active = if i == workbook.active_sheet() {
            " (active)"
        } else {
            ""
        };

        println!();
        println!("  Sheet {}: \"{}\"{}", i, sheet.name(), active);
        if let Some(range) = sheet.used_range() {
            println!(
                "    Used range: {} rows x {} columns",
                range.end.row + 1,
                range.end.col + 1
            );
        } else {
            println!("    Used range: empty");
        }
        println!("    Cells: {}", sheet.cell_count());
        println!("    Formulas: {}", formula_count);
    }

    Ok(())
}
