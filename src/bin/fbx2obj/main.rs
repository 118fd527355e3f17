//! fbx2obj - Convert and inspect legacy binary FBX files.

use legacy_fbx::container::{Document, NodeId};
use legacy_fbx::geom::{GeometryRecord, Layer};
use legacy_fbx::scene::{locate_meshes, MeshSource};
use legacy_fbx::util::BBox3d;
use legacy_fbx::{decode_document, ConvertOptions};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const BUILD_DATE: &str = env!("FBX2OBJ_BUILD_DATE");

/// Properties shown per record in `tree` output.
const TREE_PROPERTY_LIMIT: usize = 4;

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level: Option<&str> = None;
    let mut options = ConvertOptions::default();
    let mut json_mode = false;
    let mut filtered_args: Vec<&str> = Vec::new();
    let mut iter = args[1..].iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-v" | "--verbose" => level = Some("debug"),
            "-vv" | "--trace" => level = Some("trace"),
            "-q" | "--quiet" => level = Some("off"),
            "-j" | "--json" => json_mode = true,
            "--no-transform" => options.apply_transforms = false,
            "--no-normals" => options.emit_normals = false,
            "--no-uvs" => options.emit_uvs = false,
            "--no-header" => options.header_comment = false,
            "--precision" | "-p" => {
                let value = iter.next().and_then(|v| v.parse::<usize>().ok());
                match value {
                    Some(p) if p <= 17 => options.precision = p,
                    _ => {
                        eprintln!("Error: --precision expects a number between 0 and 17");
                        std::process::exit(2);
                    }
                }
            }
            _ => filtered_args.push(arg),
        }
    }

    // JSON goes to stdout and must stay clean
    if json_mode && level.is_none() {
        level = Some("off");
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    match filtered_args[0] {
        "convert" | "c" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: fbx2obj convert <in.fbx> [out.obj]");
                std::process::exit(1);
            }
            cmd_convert(filtered_args[1], filtered_args.get(2).copied(), &options);
        }

        "info" | "i" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: fbx2obj info <in.fbx> [--json]");
                std::process::exit(1);
            }
            cmd_info(filtered_args[1], &options, json_mode);
        }

        "tree" | "t" => {
            if filtered_args.len() < 2 {
                eprintln!("Error: missing file argument");
                eprintln!("Usage: fbx2obj tree <in.fbx>");
                std::process::exit(1);
            }
            cmd_tree(filtered_args[1]);
        }

        "version" | "--version" | "-V" => print_version(),

        "help" | "h" | "--help" | "-h" => print_help(),

        // A bare path converts
        path if Path::new(path).extension().is_some_and(|e| e.eq_ignore_ascii_case("fbx")) => {
            cmd_convert(path, filtered_args.get(1).copied(), &options);
        }

        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Run 'fbx2obj help' for usage");
            std::process::exit(1);
        }
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_version() {
    println!("fbx2obj {} (built {})", env!("CARGO_PKG_VERSION"), BUILD_DATE);
}

fn print_help() {
    println!("fbx2obj {} - legacy binary FBX (5000-6999) to OBJ", env!("CARGO_PKG_VERSION"));
    println!();
    println!("USAGE:");
    println!("    fbx2obj [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    c, convert <in> [out]     Convert to OBJ (stdout when no output path)");
    println!("    i, info    <in>           Show version, record count and meshes");
    println!("    t, tree    <in>           Show the record tree with property summaries");
    println!("    version                   Show version and build date");
    println!("    h, help                   Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose             Show debug output");
    println!("    -vv, --trace              Show trace output (very verbose)");
    println!("    -q, --quiet               Suppress all log output");
    println!("    -j, --json                JSON output for 'info'");
    println!("    -p, --precision <N>       Decimal places in OBJ output (default 6)");
    println!("    --no-transform            Keep meshes in local space");
    println!("    --no-normals              Do not write vn lines");
    println!("    --no-uvs                  Do not write vt lines");
    println!("    --no-header               Do not write the leading comment block");
    println!();
    println!("EXAMPLES:");
    println!("    fbx2obj old.fbx old.obj             # Convert");
    println!("    fbx2obj convert old.fbx > old.obj   # Convert to stdout");
    println!("    fbx2obj info old.fbx --json         # Mesh summary as JSON");
    println!("    fbx2obj -v tree old.fbx             # Record tree with debug log");
    println!();
    println!("NOTES:");
    println!("    - Passing a .fbx file directly is equivalent to 'convert'");
    println!("    - RUST_LOG is honored when no verbosity flag is given");
}

fn open_document(path: &str) -> Document {
    match Document::open(path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            if e.is_unsupported_version() {
                eprintln!("Hint: files from version 7000 on need a modern FBX loader");
            }
            std::process::exit(1);
        }
    }
}

fn cmd_convert(input: &str, output: Option<&str>, options: &ConvertOptions) {
    tracing::info!("converting {}", input);

    let doc = open_document(input);
    let conversion = match decode_document(&doc, options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to convert {}: {}", input, e);
            std::process::exit(1);
        }
    };
    let text = conversion.to_obj(options);

    match output {
        Some(out) => {
            if let Err(e) = std::fs::write(out, &text) {
                eprintln!("Failed to write {}: {}", out, e);
                std::process::exit(1);
            }
            let stats = conversion.stats();
            tracing::info!(
                meshes = conversion.meshes.len(),
                triangles = stats.triangles,
                bytes = text.len(),
                "wrote {}",
                out
            );
        }
        None => print!("{}", text),
    }
}

fn layer_layout(layer: Option<&Layer>) -> String {
    match layer {
        Some(l) => format!("{} + {}", l.mapping, l.reference),
        None => "none".to_string(),
    }
}

fn cmd_info(path: &str, options: &ConvertOptions, json_mode: bool) {
    let doc = open_document(path);

    let sources: Vec<MeshSource> = locate_meshes(&doc, options.apply_transforms).unwrap_or_default();
    let records: Vec<Option<GeometryRecord>> = sources
        .iter()
        .map(|s| match GeometryRecord::from_record(&doc, s.record, true, true) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(mesh = %s.name, "cannot read geometry: {}", e);
                None
            }
        })
        .collect();
    let conversion = decode_document(&doc, options);

    if json_mode {
        let meshes: Vec<serde_json::Value> = sources
            .iter()
            .zip(&records)
            .map(|(source, record)| {
                let stats = conversion
                    .as_ref()
                    .ok()
                    .and_then(|c| c.meshes.iter().find(|m| m.source == Some(source.record)))
                    .map(|m| (m.stats, m.bounds()));
                serde_json::json!({
                    "name": source.name,
                    "record": doc.node(source.record).first_str(),
                    "vertices": record.as_ref().map(|r| r.num_vertices()),
                    "polygons": record.as_ref().map(|r| r.num_polygons()),
                    "triangles": stats.map(|(s, _)| s.triangles),
                    "degenerate_polygons": stats.map(|(s, _)| s.degenerate_polygons),
                    "bounds": stats.map(|(_, b)| [b.min.to_array(), b.max.to_array()]),
                    "center": stats.map(|(_, b)| b.center().to_array()),
                    "size": stats.map(|(_, b)| b.size().to_array()),
                    "normals": layer_layout(record.as_ref().and_then(|r| r.normals.as_ref())),
                    "uvs": layer_layout(record.as_ref().and_then(|r| r.uvs.as_ref())),
                    "translation": source.transform.w_axis.truncate().to_array(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({
            "file": path,
            "version": doc.version(),
            "records": doc.len(),
            "meshes": meshes,
            "convertible": conversion.is_ok(),
            "error": conversion.as_ref().err().map(|e| e.to_string()),
        })).unwrap_or_default());
        return;
    }

    println!("File: {}", path);
    println!("Version: {}", doc.version());
    println!("Records: {}", doc.len());
    println!("Meshes: {}", sources.len());
    println!();

    for (source, record) in sources.iter().zip(&records) {
        println!("  {}", source.name);
        if let Some(r) = record {
            println!("    vertices:  {}", r.num_vertices());
            println!("    polygons:  {}", r.num_polygons());
            println!("    normals:   {}", layer_layout(r.normals.as_ref()));
            println!("    uvs:       {}", layer_layout(r.uvs.as_ref()));
        }
        let t = source.transform.w_axis.truncate();
        println!("    position:  ({:.4}, {:.4}, {:.4})", t.x, t.y, t.z);
    }

    println!();
    match &conversion {
        Ok(c) => {
            let stats = c.stats();
            println!("Triangles: {}", stats.triangles);
            if stats.degenerate_polygons > 0 {
                println!("Skipped polygons: {}", stats.degenerate_polygons);
            }
            let bounds: BBox3d = c.meshes.iter().flat_map(|m| m.positions.iter().copied()).collect();
            if !bounds.is_empty() {
                let (min, max) = (bounds.min, bounds.max);
                let (center, size) = (bounds.center(), bounds.size());
                println!("Bounds: ({:.4}, {:.4}, {:.4}) - ({:.4}, {:.4}, {:.4})", min.x, min.y, min.z, max.x, max.y, max.z);
                println!("Center: ({:.4}, {:.4}, {:.4})", center.x, center.y, center.z);
                println!("Size:   ({:.4}, {:.4}, {:.4})", size.x, size.y, size.z);
            }
        }
        Err(e) => println!("Not convertible: {}", e),
    }
}

fn cmd_tree(path: &str) {
    let doc = open_document(path);

    println!("File: {} (version {})", path, doc.version());
    println!();

    let mut stack: Vec<(NodeId, usize)> = doc.roots().iter().rev().map(|&id| (id, 0)).collect();
    while let Some((id, depth)) = stack.pop() {
        let node = doc.node(id);
        let indent = "  ".repeat(depth);
        let mut props: Vec<String> = node
            .properties
            .iter()
            .take(TREE_PROPERTY_LIMIT)
            .map(|p| p.to_string())
            .collect();
        if node.properties.len() > TREE_PROPERTY_LIMIT {
            props.push(format!("... +{}", node.properties.len() - TREE_PROPERTY_LIMIT));
        }
        if props.is_empty() {
            println!("{}{}", indent, node.name);
        } else {
            println!("{}{}: {}", indent, node.name, props.join(", "));
        }
        for &child in node.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}
