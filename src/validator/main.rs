//! Standalone validator for ball catalog files.
//!
//! Checks that a catalog parses, that no category holds an empty name and
//! that no Pokémon is listed in two categories.

use std::process::ExitCode;

use clap::Parser;

use pokemon_user_bot::config::BallCatalog;

/// Ball catalog validator.
#[derive(Parser, Debug)]
#[command(name = "validate_catalog")]
#[command(about = "Validates ball catalog files for the Pokémon userbot")]
#[command(version)]
struct Args {
    /// Path to the JSON catalog file to validate.
    #[arg(short, long, default_value = "catalog.json")]
    file: String,

    /// Generate an example catalog file at the specified path.
    #[arg(long)]
    generate_example: Option<String>,

    /// List the Pokémon of every category.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(output_path) = args.generate_example {
        return generate_example(&output_path);
    }

    validate_catalog(&args.file, args.verbose)
}

fn generate_example(output_path: &str) -> ExitCode {
    let example = BallCatalog::example();

    match example.save_to_file(output_path) {
        Ok(()) => {
            println!("✓ Example catalog written to: {output_path}");
            println!("\nThe file contains {} example Pokémon.", example.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Failed to write example file: {e}");
            ExitCode::FAILURE
        }
    }
}

fn validate_catalog(path: &str, verbose: bool) -> ExitCode {
    println!("Validating: {path}\n");

    let catalog = match BallCatalog::load_from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("✗ Failed to load catalog: {e}");
            return ExitCode::FAILURE;
        }
    };

    if catalog.is_empty() {
        println!("✗ Validation failed: no Pokémon configured in any category");
        return ExitCode::FAILURE;
    }

    let mut errors = 0;
    let mut empty_categories = 0;

    for (category, result) in catalog.validate_all() {
        let names = catalog.get(category);
        println!("[{category}] {} Pokémon", names.len());

        if verbose && !names.is_empty() {
            println!("  {}", names.join(", "));
        }

        match result {
            Ok(()) if names.is_empty() => {
                empty_categories += 1;
                println!("  ⚠ Warning: category is empty");
            }
            Ok(()) => {
                if verbose {
                    println!("  ✓ OK");
                }
            }
            Err(e) => {
                errors += 1;
                println!("  ✗ Error: {e}");
            }
        }
    }

    println!();

    let total = catalog.len();
    if errors == 0 {
        println!("✓ Catalog with {total} Pokémon is valid!");
        if empty_categories > 0 {
            println!("  ({empty_categories} empty categor(y/ies) - `list` will report them as empty)");
        }
        ExitCode::SUCCESS
    } else {
        println!("✗ Validation failed: {errors} error(s) across {total} Pokémon");
        ExitCode::FAILURE
    }
}
