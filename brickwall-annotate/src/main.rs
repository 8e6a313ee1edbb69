//! A command line interface that annotates a file with the bricks of a template.
//!
//! The resulting brick wall is printed as JSON.

use std::{fs, io, path::PathBuf, process};

use brickwall_builtin_templates::{built_in_template, built_in_template_sources};
use brickwall_common::{Brick, BrickWall, Endianness, Input};
use brickwall_lang::{ExecOptions, ExecReport, View, compile, execute_with};
use clap::Parser;
use serde_json::{Map, Value};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// brickwall-annotate - annotates bytes with bricks according to a template
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Config {
    /// The file to annotate, stdin if omitted
    file: Option<PathBuf>,
    /// Lists the built-in templates
    #[arg(short, long)]
    list: bool,
    /// The built-in template to use
    #[arg(short, long)]
    template: Option<String>,
    /// A custom template to use
    #[arg(short, long)]
    custom: Option<PathBuf>,
    /// The offset at which the first field is placed
    #[arg(short, long, default_value_t = 0)]
    offset: i64,
    /// Reads multi-byte values as big endian
    #[arg(short, long)]
    big_endian: bool,
    /// Prints the compiled template instead of annotating
    #[arg(long)]
    dump: bool,
}

/// Installs a subscriber that logs to stderr, filtered through `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(true))
        .with(EnvFilter::from_default_env())
        .init();
}

/// The entry point for the application.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = Config::parse();

    if config.list {
        for name in built_in_template_sources().keys() {
            println!("{name}");
        }
        println!();
        println!(
            "if the `--custom` (or `-c`) argument is used, the template at the supplied path will be used instead"
        );
        return Ok(());
    }

    let template = match (&config.custom, &config.template) {
        (Some(path), _) => {
            let content = fs::read_to_string(path)?;

            match compile(&content) {
                Ok(template) => template,
                Err(err) => {
                    eprintln!("{}: {err}", path.display());
                    process::exit(1);
                }
            }
        }
        (None, Some(name)) => match built_in_template(name) {
            Some(template) => template?,
            None => {
                eprintln!("unknown template name: {name}, exiting...");
                process::exit(1);
            }
        },
        (None, None) => {
            eprintln!("no template specified, exiting...");
            process::exit(1);
        }
    };

    if config.dump {
        println!("{template}");
        return Ok(());
    }

    let input = match config.file {
        Some(path) => Input::from_path(path)?,
        None => Input::from_stdin()?,
    };
    let options = ExecOptions {
        start_offset: config.offset,
        endianness: if config.big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        },
    };

    let mut wall = BrickWall::new();
    let report = execute_with(&template, &mut wall, &View::from(&input), options)?;

    println!("{}", annotation_to_json(&wall, &report));

    Ok(())
}

/// Converts the given brick to JSON.
fn brick_to_json(wall: &BrickWall, brick: &Brick) -> Value {
    let mut object = Map::new();

    object.insert("name".into(), Value::from(brick.name.as_str()));
    object.insert(
        "type".into(),
        wall.type_info(brick.type_id)
            .map_or(Value::Null, |info| Value::from(info.name.as_str())),
    );
    object.insert("start".into(), Value::from(brick.start));
    object.insert("size".into(), Value::from(brick.size));
    object.insert("color".into(), Value::from(format!("#{:06x}", brick.color)));

    Value::Object(object)
}

/// Converts the resulting wall and the rejections of the execution to JSON.
fn annotation_to_json(wall: &BrickWall, report: &ExecReport) -> Value {
    let bricks = wall
        .bricks()
        .iter()
        .map(|brick| brick_to_json(wall, brick))
        .collect();

    let structs = wall
        .structs()
        .iter()
        .map(|def| {
            let mut object = Map::new();

            object.insert("name".into(), Value::from(def.name.as_str()));
            object.insert("size".into(), Value::from(def.size()));
            object.insert("color".into(), Value::from(format!("#{:06x}", def.color)));
            object.insert(
                "members".into(),
                Value::Array(
                    def.members()
                        .iter()
                        .map(|member| brick_to_json(wall, member))
                        .collect(),
                ),
            );

            Value::Object(object)
        })
        .collect();

    let rejected = report
        .rejected
        .iter()
        .map(|err| Value::from(err.to_string()))
        .collect();

    let mut object = Map::new();
    object.insert("bricks".into(), Value::Array(bricks));
    object.insert("structs".into(), Value::Array(structs));
    object.insert("rejected".into(), Value::Array(rejected));

    Value::Object(object)
}
