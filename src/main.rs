// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::path;

use anitree::{ScriptContext, ScriptError, ScriptValue};
use svganim::{ObjectKind, Repeat, Scene, Score};

macro_rules! timed {
    ($args:expr, $name:expr, $task:expr) => {
        if $args.perf {
            let now = std::time::Instant::now();
            let res = $task;
            println!("{}: {:.2}ms", $name, now.elapsed().as_micros() as f64 / 1000.0);
            res
        } else {
            $task
        }
    };
}

fn main() {
    if let Err(e) = process() {
        eprintln!("Error: {}.", e);
        std::process::exit(1);
    }
}

const HELP: &str = "\
svganim builds an animated scene from an SVG document.

USAGE:
  svganim [OPTIONS] <in-svg>

  svganim in.svg
  svganim --time 500 --click button in.svg

OPTIONS:
      --help                    Prints this help
  -V, --version                 Prints version

  --resources-dir DIR           Sets a directory that will be used during
                                relative paths resolving.
                                [default: input file directory]
  --time MS                     Applies the animations at a time before printing
  --click ID                    Delivers a click to an element
  --dump-xml                    Prints the document after scripts and animations
  --perf                        Prints performance stats
  --quiet                       Disables warnings
  --verbose                     Enables all log messages

ARGS:
  <in-svg>                      Input file
";

#[derive(Debug)]
struct Args {
    resources_dir: Option<path::PathBuf>,
    time: Option<f64>,
    click: Option<String>,
    dump_xml: bool,
    perf: bool,
    quiet: bool,
    verbose: bool,
    input: path::PathBuf,
}

fn collect_args() -> Result<Args, pico_args::Error> {
    let mut input = pico_args::Arguments::from_env();

    if input.contains("--help") {
        print!("{}", HELP);
        std::process::exit(0);
    }

    if input.contains(["-V", "--version"]) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        std::process::exit(0);
    }

    Ok(Args {
        resources_dir:  input.opt_value_from_str("--resources-dir")?,
        time:           input.opt_value_from_fn("--time", parse_time)?,
        click:          input.opt_value_from_str("--click")?,
        dump_xml:       input.contains("--dump-xml"),
        perf:           input.contains("--perf"),
        quiet:          input.contains("--quiet"),
        verbose:        input.contains("--verbose"),
        input:          input.free_from_str()?,
    })
}

fn parse_time(s: &str) -> Result<f64, String> {
    let n: f64 = s.parse().map_err(|_| "invalid time")?;

    if n >= 0.0 {
        Ok(n)
    } else {
        Err("TIME cannot be negative".to_string())
    }
}

fn process() -> Result<(), String> {
    let args = match collect_args() {
        Ok(args) => args,
        Err(e) => {
            println!("{}", HELP);
            return Err(e.to_string());
        }
    };

    if !args.quiet {
        if let Ok(()) = log::set_logger(&LOGGER) {
            let level = if args.verbose {
                log::LevelFilter::Trace
            } else {
                log::LevelFilter::Warn
            };
            log::set_max_level(level);
        }
    }

    let text = timed!(args, "Reading",
        std::fs::read_to_string(&args.input).map_err(|_| "failed to open the provided file")
    )?;

    let resources_dir = match args.resources_dir {
        Some(ref v) => Some(v.clone()),
        None => {
            // Get input file absolute directory.
            std::fs::canonicalize(&args.input).ok().and_then(|p| p.parent().map(|p| p.to_path_buf()))
        }
    };

    let opt = anitree::Options {
        base_iri: resources_dir.map(|p| p.display().to_string()),
        ..anitree::Options::default()
    };

    let mut doc = timed!(args, "Parsing",
        anitree::Document::parse_str(&text, &opt).map_err(|e| e.to_string())
    )?;

    let fetcher = anitree::LocalFetcher;
    let mut script = TracingScript;

    svganim::expose_document(&doc, &mut script).map_err(|e| e.to_string())?;
    timed!(args, "Scripts",
        svganim::run_scripts(&doc, &fetcher, &mut script).map_err(|e| e.to_string())
    )?;

    let (mut scene, score) = timed!(args, "Building", svganim::build_scene(&mut doc, &fetcher));
    doc.process_events(&mut script).map_err(|e| e.to_string())?;

    if let Some(ref id) = args.click {
        click(&doc, &scene, id, &mut script)?;
    }

    if let Some(time) = args.time {
        timed!(args, "Animating", {
            score.apply(&mut doc, time);
            scene.sync(&mut doc);
        });
    }

    print_scene(&doc, &scene);
    print_score(&doc, &score);

    if args.dump_xml {
        print!("{}", doc.to_xml_string());
    }

    Ok(())
}

fn click(
    doc: &anitree::Document,
    scene: &Scene,
    id: &str,
    script: &mut dyn ScriptContext,
) -> Result<(), String> {
    let node = doc
        .element_by_id(id)
        .ok_or_else(|| format!("SVG doesn't have '{}' ID", id))?;

    let object = match scene.object_for(node.id()) {
        Some(v) => v,
        None => {
            log::warn!("Element '{}' has no scene object.", id);
            return Ok(());
        }
    };

    let delivered = scene
        .button_release(doc, object, anitree::MouseData::default(), script)
        .map_err(|e| e.to_string())?;

    if !delivered {
        log::warn!("Element '{}' does not react to clicks.", id);
    }

    Ok(())
}

fn describe(doc: &anitree::Document, node: anitree::NodeId) -> String {
    let n = doc.get(node);
    let tag_name = n.tag_name().map(|t| t.to_str()).unwrap_or("node");
    if n.element_id().is_empty() {
        tag_name.to_string()
    } else {
        format!("{}#{}", tag_name, n.element_id())
    }
}

fn print_scene(doc: &anitree::Document, scene: &Scene) {
    println!("Scene: {} objects", scene.len());
    for (i, object) in scene.objects().iter().enumerate() {
        let details = match object.kind {
            ObjectKind::Group => "group".to_string(),
            ObjectKind::Path(Some(ref path)) => {
                let b = path.bounds();
                format!("path {},{} {}x{}", b.x(), b.y(), b.width(), b.height())
            }
            ObjectKind::Path(None) => "path (empty)".to_string(),
            ObjectKind::Text(ref text) => format!("text {},{} '{}'", text.x, text.y, text.text),
            ObjectKind::Image(ref image) => format!(
                "{} {} ({})",
                if image.is_video { "video" } else { "image" },
                image.href.as_deref().unwrap_or("-"),
                match image.data {
                    Some(ref data) => format!("{} bytes", data.len()),
                    None => "not loaded".to_string(),
                }
            ),
        };

        let parent = object.parent.map(|p| p.get().to_string()).unwrap_or_else(|| "-".to_string());
        let mut flags = String::new();
        if object.reactive {
            flags.push_str(" reactive");
        }
        if object.dirty {
            flags.push_str(" dirty");
        }

        println!("  {} {} parent={} {}{}", i, describe(doc, object.node), parent, details, flags);
    }
}

fn print_score(doc: &anitree::Document, score: &Score) {
    println!("Score: {} animations", score.len());
    for entry in score.entries() {
        let repeat = match entry.timeline.repeat {
            Repeat::Count(n) => format!("x{}", n),
            Repeat::Loop => "loop".to_string(),
        };

        println!(
            "  {}.{} {} -> {} {}ms {}",
            describe(doc, entry.node),
            entry.attribute,
            entry.interval.from,
            entry.interval.to,
            entry.timeline.duration,
            repeat
        );
    }
}

/// A script context that only logs what it's asked to do.
struct TracingScript;

impl ScriptContext for TracingScript {
    fn eval(&mut self, source: &str, file: &str) -> Result<ScriptValue, ScriptError> {
        println!("eval({}): {}", file, source);
        Ok(ScriptValue::Undefined)
    }

    fn call_function(&mut self, name: &str, args: &[ScriptValue]) -> Result<ScriptValue, ScriptError> {
        println!("call: {}({:?})", name, args);
        Ok(ScriptValue::Undefined)
    }

    fn add_global_object(&mut self, name: &str, value: ScriptValue) -> Result<(), ScriptError> {
        println!("global: {} = {:?}", name, value);
        Ok(())
    }
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            let line = record.line().unwrap_or(0);

            match record.level() {
                log::Level::Error => eprintln!("Error (in {}:{}): {}", target, line, record.args()),
                log::Level::Warn  => eprintln!("Warning (in {}:{}): {}", target, line, record.args()),
                log::Level::Info  => eprintln!("Info (in {}:{}): {}", target, line, record.args()),
                log::Level::Debug => eprintln!("Debug (in {}:{}): {}", target, line, record.args()),
                log::Level::Trace => eprintln!("Trace (in {}:{}): {}", target, line, record.args()),
            }
        }
    }

    fn flush(&self) {}
}
