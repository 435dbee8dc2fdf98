//! pkgexport CLI - package a scene file and export meshes plus scene description.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pkgexport::export::ValidationWarning;
use pkgexport::grouping::CancelToken;
use pkgexport::prelude::*;
use pkgexport::scene::ObjectKind;

/// Verbosity level
#[derive(Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Info => "pkgexport=info",
            Verbosity::Debug => "pkgexport=debug",
            Verbosity::Trace => "pkgexport=trace",
        }
    }
}

fn init_logging(level: Verbosity) {
    // RUST_LOG wins over the command-line flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = Verbosity::Info;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = Verbosity::Debug,
            "-vv" | "--trace" => level = Verbosity::Trace,
            "-q" | "--quiet" => level = Verbosity::Quiet,
            _ => filtered_args.push(arg.as_str()),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => match filtered_args.get(1) {
            Some(path) => cmd_info(path),
            None => usage_error("pkgexport info <scene.json>"),
        },
        "group" | "g" => match filtered_args.get(1) {
            Some(path) => cmd_group(path),
            None => usage_error("pkgexport group <scene.json>"),
        },
        "export" | "e" => ExportArgs::parse(&filtered_args[1..]).and_then(cmd_export),
        "--version" | "version" => {
            print_version();
            Ok(())
        }
        "help" | "h" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'pkgexport help' for usage.");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn usage_error(usage: &str) -> anyhow::Result<()> {
    bail!("missing file argument\nUsage: {}", usage)
}

fn print_version() {
    println!(
        "pkgexport {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("PKGEXPORT_BUILD_DATE"),
        env!("PKGEXPORT_BUILD_TIME")
    );
}

fn print_help() {
    println!("pkgexport - package scene transforms and export them for re-instancing");
    println!();
    println!("USAGE:");
    println!("    pkgexport [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info   <scene.json>          Show object and mesh counts");
    println!("    g, group  <scene.json>          Auto-generate packages and list them");
    println!("    e, export <scene.json> [FLAGS]  Auto-group, then export meshes and scene description");
    println!("    version                         Show version and build date");
    println!("    h, help                         Show this help");
    println!();
    println!("EXPORT FLAGS:");
    println!("    --out <dir>        Output directory (default: saved setting)");
    println!("    --name <file>      Scene description base name (default: saved setting)");
    println!("    --root <object>    Root transform; placements are relative to it");
    println!("    --no-mesh          Skip mesh export");
    println!("    --no-desc          Skip scene description export");
    println!("    --triangulate      Triangulate exported meshes");
    println!("    --yes              Continue past warnings without asking");
    println!("    --save-settings    Store the resulting settings as new defaults");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Suppress all log output");
    println!();
    println!("EXAMPLES:");
    println!("    pkgexport info level.json");
    println!("    pkgexport group level.json");
    println!("    pkgexport export level.json --out ./build --name level01 --root origin");
}

fn open_scene(path: &str) -> anyhow::Result<MemoryScene> {
    info!("Opening scene: {}", path);
    MemoryScene::open(path).with_context(|| format!("failed to open {}", path))
}

fn cmd_info(path: &str) -> anyhow::Result<()> {
    let scene = open_scene(path)?;

    let transforms = scene.iter().filter(|(_, o)| o.kind == ObjectKind::Transform).count();
    let meshes = scene.mesh_transforms();
    let faces: usize = meshes
        .iter()
        .filter_map(|id| scene.object(*id).and_then(|o| o.mesh.as_ref()))
        .map(|m| m.face_counts.len())
        .sum();

    println!("Scene: {}", path);
    println!("Objects:     {}", scene.len());
    println!("  Transforms: {}", transforms);
    println!("  Meshes:     {} ({} faces)", meshes.len(), faces);
    println!("Selected:    {}", scene.selection().len());
    Ok(())
}

fn print_packages(session: &Session) {
    for row in session.summaries() {
        let name = if row.name.is_empty() { "<unnamed>" } else { row.name.as_str() };
        let marker = if row.is_current { "*" } else { " " };
        let Some(pack) = session.registry.get(row.id) else { continue };
        let note = if pack.is_exportable() { "" } else { "  (not exported)" };
        println!("{} {:<32} {:>4} item(s){}", marker, name, row.member_count, note);
        for member in pack.member_names() {
            println!("      {}", member);
        }
    }
}

fn cmd_group(path: &str) -> anyhow::Result<()> {
    let scene = open_scene(path)?;
    let mut session = Session::default();
    let report = session.run_auto_group(&scene, &CancelToken::new(), |p| {
        debug!("{}/{} shapes, {} package(s)", p.claimed, p.total, p.packages);
    });
    println!("Created {} package(s)", report.created.len());
    print_packages(&session);
    Ok(())
}

struct ExportArgs {
    scene: String,
    out: Option<String>,
    name: Option<String>,
    root: Option<String>,
    no_mesh: bool,
    no_desc: bool,
    triangulate: bool,
    yes: bool,
    save_settings: bool,
}

impl ExportArgs {
    fn parse(args: &[&str]) -> anyhow::Result<Self> {
        let mut it = args.iter().copied();
        let mut parsed = ExportArgs {
            scene: String::new(),
            out: None,
            name: None,
            root: None,
            no_mesh: false,
            no_desc: false,
            triangulate: false,
            yes: false,
            save_settings: false,
        };
        while let Some(arg) = it.next() {
            match arg {
                "--out" | "-o" => parsed.out = Some(it.next().context("--out needs a directory")?.to_string()),
                "--name" | "-n" => parsed.name = Some(it.next().context("--name needs a file name")?.to_string()),
                "--root" | "-r" => parsed.root = Some(it.next().context("--root needs an object name")?.to_string()),
                "--no-mesh" => parsed.no_mesh = true,
                "--no-desc" => parsed.no_desc = true,
                "--triangulate" => parsed.triangulate = true,
                "--yes" | "-y" => parsed.yes = true,
                "--save-settings" => parsed.save_settings = true,
                s if s.starts_with('-') => bail!("unknown export flag: {}", s),
                s if parsed.scene.is_empty() => parsed.scene = s.to_string(),
                s => bail!("unexpected argument: {}", s),
            }
        }
        if parsed.scene.is_empty() {
            bail!("missing file argument\nUsage: pkgexport export <scene.json> [FLAGS]");
        }
        Ok(parsed)
    }
}

fn confirm_warnings(warnings: &[ValidationWarning], assume_yes: bool) -> bool {
    for w in warnings {
        eprintln!("Warning: {}", w);
    }
    if assume_yes {
        return true;
    }
    eprint!("Continue? [y/N] ");
    io::stderr().flush().ok();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim(), "y" | "Y" | "yes")
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut scene = open_scene(&args.scene)?;

    let mut settings = ExportSettings::load();
    if let Some(out) = &args.out {
        settings.set_output_dir(out);
    }
    if let Some(name) = &args.name {
        settings.set_file_name(name);
    }
    if args.no_mesh {
        settings.export_meshes = false;
    }
    if args.no_desc {
        settings.export_description = false;
    }
    if args.triangulate {
        settings.mesh_properties.triangulate = true;
    }
    if settings.output_dir.as_os_str().is_empty() {
        settings.output_dir = PathBuf::from(".");
    }
    if settings.file_name.is_empty() {
        let stem = PathBuf::from(&args.scene)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        settings.set_file_name(&stem);
    }

    let mut session = Session::new(settings);
    let grouped = session.run_auto_group(&scene, &CancelToken::new(), |_| {});
    // the session starts with one empty package; drop it once grouping produced real ones
    if !grouped.created.is_empty() {
        let placeholder = session.registry.packages()[0].id();
        if session.registry.get(placeholder).is_some_and(|p| p.is_empty()) {
            session.remove_package(placeholder)?;
        }
    }

    if let Some(root) = &args.root {
        session.set_root(&scene, root)?;
    }

    let mut exporter = ObjExporter::new();
    let yes = args.yes;
    let report = session.run_export(&mut scene, &mut exporter, |w| confirm_warnings(w, yes))?;

    if let Some(meshes) = &report.meshes {
        println!(
            "Meshes: {} written, {} skipped, {} failed",
            meshes.exported.len(),
            meshes.skipped.len(),
            meshes.failed.len()
        );
        for f in &meshes.failed {
            println!("  failed '{}': {}", f.package, f.error);
        }
    }
    match &report.description {
        Some(Ok(path)) => println!("Scene description: {}", path.display()),
        Some(Err(e)) => println!("Scene description failed: {}", e),
        None => {}
    }

    if args.save_settings {
        session.settings.save()?;
        info!("settings saved");
    }

    if !report.is_success() {
        bail!("export finished with errors");
    }
    Ok(())
}
