use orgchart::render::export::{self, ExportError, ExportFormat};
use orgchart::render::raster::{self, RasterError, RasterOptions};
use orgchart::render::{ChartOptions, ColorStyle, HeadlessError, SvgRenderOptions};
use orgchart::{
    ColumnRules, DepartmentFilter, Hierarchy, NormalizedTable, PersonRepository, Rgb,
    SettingsIoError, SettingsStore, load_table_with_rules, select_people,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Invalid(String),
    Io(std::io::Error),
    Data(orgchart::Error),
    Headless(HeadlessError),
    Raster(RasterError),
    Export(ExportError),
    Settings(SettingsIoError),
    Json(serde_json::Error),
}

impl CliError {
    fn is_empty_selection(&self) -> bool {
        let data = match self {
            CliError::Data(err) => err,
            CliError::Headless(HeadlessError::Data(err)) => err,
            CliError::Raster(RasterError::Headless(HeadlessError::Data(err))) => err,
            _ => return false,
        };
        matches!(data, orgchart::Error::EmptySelection { .. })
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Invalid(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Data(err) => write!(f, "{err}"),
            CliError::Headless(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
            CliError::Export(err) => write!(f, "{err}"),
            CliError::Settings(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<orgchart::Error> for CliError {
    fn from(value: orgchart::Error) -> Self {
        Self::Data(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Headless(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
        Self::Raster(value)
    }
}

impl From<ExportError> for CliError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<SettingsIoError> for CliError {
    fn from(value: SettingsIoError) -> Self {
        Self::Settings(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Render,
    Inspect,
    Layout,
    Colors,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    positionals: Vec<String>,
    pretty: bool,
    render_format: RenderFormat,
    scale: f64,
    department: Option<String>,
    root: Option<String>,
    highlight: Option<String>,
    search: Option<String>,
    style: ColorStyle,
    hide_department: bool,
    hide_mail: bool,
    no_legend: bool,
    background: Option<String>,
    diagram_id: Option<String>,
    settings: Option<String>,
    rules: Option<String>,
    out: Option<String>,
}

fn usage() -> &'static str {
    "orgchart-cli\n\
\n\
USAGE:\n\
  orgchart-cli [render] [--format svg|png|pdf] [CHART OPTIONS] [--background <css-color>] [--id <svg-id>] [--out <path>] <table>\n\
  orgchart-cli inspect [--pretty] [--rules <json>] [--dept <name>] <table>\n\
  orgchart-cli layout [--pretty] [CHART OPTIONS] <table>\n\
  orgchart-cli colors [--settings <json>] list|set <title> <#rrggbb>|unset <title>|clear\n\
\n\
CHART OPTIONS:\n\
  --scale <n>            render scale (default 1.0)\n\
  --dept <name>          only people of this department ('all' for everyone)\n\
  --root <username>      draw only the subtree under this person\n\
  --highlight <username> outline this person\n\
  --search <text>        highlight the first person whose username or name contains <text>\n\
  --style bg|stripe      title color as card background or left stripe\n\
  --hide-dept            omit the department from the second line\n\
  --hide-mail            omit the mail line\n\
  --no-legend            omit the title color legend\n\
  --settings <json>      title color settings file (default ~/.org_chart_settings.json)\n\
  --rules <json>         extra column matching rules, tried before the built-in ones\n\
\n\
NOTES:\n\
  - <table> is a .csv, .xlsx, .xlsm, .xls or .ods file (first sheet, first row is the header).\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - PNG/PDF output defaults to writing next to the input file.\n\
  - Logging goes to stderr; set ORGCHART_LOG (or RUST_LOG), e.g. ORGCHART_LOG=debug.\n\
  - Exit codes: 2 usage error, 3 empty department selection, 1 any other failure.\n\
"
}

fn next_value<'a>(it: &mut impl Iterator<Item = &'a String>) -> Result<String, CliError> {
    it.next().cloned().ok_or(CliError::Usage(usage()))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        command: Command::Render,
        render_format: RenderFormat::Svg,
        scale: 1.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    let mut saw_command = false;
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" if !saw_command && args.positionals.is_empty() => {
                args.command = Command::Render;
                saw_command = true;
            }
            "inspect" if !saw_command && args.positionals.is_empty() => {
                args.command = Command::Inspect;
                saw_command = true;
            }
            "layout" if !saw_command && args.positionals.is_empty() => {
                args.command = Command::Layout;
                saw_command = true;
            }
            "colors" if !saw_command && args.positionals.is_empty() => {
                args.command = Command::Colors;
                saw_command = true;
            }
            "--pretty" => args.pretty = true,
            "--hide-dept" => args.hide_department = true,
            "--hide-mail" => args.hide_mail = true,
            "--no-legend" => args.no_legend = true,
            "--format" => {
                args.render_format = next_value(&mut it)?
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                args.scale = next_value(&mut it)?
                    .parse::<f64>()
                    .map_err(|_| CliError::Usage(usage()))?;
                if !(args.scale.is_finite() && args.scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--style" => {
                args.style = next_value(&mut it)?
                    .parse::<ColorStyle>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--dept" => args.department = Some(next_value(&mut it)?),
            "--root" => args.root = Some(next_value(&mut it)?),
            "--highlight" => args.highlight = Some(next_value(&mut it)?),
            "--search" => args.search = Some(next_value(&mut it)?),
            "--background" => {
                let bg = next_value(&mut it)?;
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--id" => args.diagram_id = Some(next_value(&mut it)?),
            "--settings" => args.settings = Some(next_value(&mut it)?),
            "--rules" => args.rules = Some(next_value(&mut it)?),
            "--out" => args.out = Some(next_value(&mut it)?),
            "--" => {
                args.positionals.extend(it.by_ref().cloned());
            }
            other if other.starts_with("--") => return Err(CliError::Usage(usage())),
            positional => args.positionals.push(positional.to_string()),
        }
    }

    Ok(args)
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn default_out_path(input: &str, ext: &str) -> PathBuf {
    PathBuf::from(input).with_extension(ext)
}

fn single_input(args: &Args) -> Result<&str, CliError> {
    match args.positionals.as_slice() {
        [path] => Ok(path.as_str()),
        _ => Err(CliError::Usage(usage())),
    }
}

fn settings_store(args: &Args) -> SettingsStore {
    args.settings
        .as_deref()
        .map(SettingsStore::new)
        .unwrap_or_default()
}

fn column_rules(args: &Args) -> Result<ColumnRules, CliError> {
    let Some(path) = args.rules.as_deref() else {
        return Ok(ColumnRules::default());
    };
    let text = std::fs::read_to_string(path)?;
    Ok(ColumnRules::default().with_overrides(ColumnRules::from_json_str(&text)?))
}

fn department_filter(args: &Args) -> DepartmentFilter {
    args.department
        .as_deref()
        .map(DepartmentFilter::parse)
        .unwrap_or(DepartmentFilter::All)
}

struct Loaded {
    table: NormalizedTable,
    people: PersonRepository,
    hierarchy: Hierarchy,
}

fn load(args: &Args, input: &str) -> Result<Loaded, CliError> {
    let table = load_table_with_rules(Path::new(input), &column_rules(args)?)?;
    let people = select_people(&table, &department_filter(args))?;
    let hierarchy = Hierarchy::build(&people);
    Ok(Loaded {
        table,
        people,
        hierarchy,
    })
}

fn chart_options(args: &Args, people: &PersonRepository) -> ChartOptions {
    let highlight = args.highlight.clone().or_else(|| {
        args.search
            .as_deref()
            .and_then(|q| people.search(q))
            .map(|p| p.username.clone())
    });
    if let (Some(query), None) = (args.search.as_deref(), highlight.as_ref()) {
        tracing::warn!(query, "no person matches the search");
    }
    ChartOptions {
        scale: args.scale,
        start_from: args.root.clone(),
        title_colors: settings_store(args).load().title_colors,
        show_department: !args.hide_department,
        show_mail: !args.hide_mail,
        highlight,
        color_style: args.style,
        legend: !args.no_legend,
        ..ChartOptions::default()
    }
}

fn svg_options(args: &Args, input: &str) -> SvgRenderOptions {
    let id = args.diagram_id.clone().unwrap_or_else(|| {
        Path::new(input)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    SvgRenderOptions {
        diagram_id: Some(orgchart::render::sanitize_svg_id(&id)),
        ..SvgRenderOptions::default()
    }
}

#[derive(Serialize)]
struct InspectOut<'a> {
    rows: usize,
    people: usize,
    roots: &'a [String],
    departments: Vec<String>,
    titles: Vec<String>,
    cycle: Option<Vec<String>>,
}

fn run_colors(args: &Args) -> Result<(), CliError> {
    let store = settings_store(args);
    let mut settings = store.try_load()?;
    let words: Vec<&str> = args.positionals.iter().map(String::as_str).collect();
    match words.as_slice() {
        [] | ["list"] => {
            for (title, color) in settings.title_colors.iter() {
                println!("{title}\t{color}");
            }
            return Ok(());
        }
        ["set", title, hex] => {
            let color = Rgb::from_hex(hex)
                .ok_or_else(|| CliError::Invalid(format!("invalid color: {hex}")))?;
            settings.title_colors.set(*title, color);
        }
        ["unset", title] => {
            if settings.title_colors.remove(title).is_none() {
                tracing::warn!(title, "title has no color");
            }
        }
        ["clear"] => settings.title_colors.clear(),
        _ => return Err(CliError::Usage(usage())),
    }
    store.save(&settings)?;
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    if let Command::Colors = args.command {
        return run_colors(&args);
    }

    let input = single_input(&args)?;
    let loaded = load(&args, input)?;

    match args.command {
        Command::Inspect => {
            let out = InspectOut {
                rows: loaded.table.len(),
                people: loaded.people.len(),
                roots: loaded.hierarchy.roots(),
                departments: loaded.table.departments(),
                titles: loaded.table.titles(),
                cycle: loaded.hierarchy.detect_cycle().map(|c| c.members),
            };
            write_json(&out, args.pretty)
        }
        Command::Layout => {
            let options = chart_options(&args, &loaded.people);
            let layout = orgchart::render::relayout(&loaded.people, &loaded.hierarchy, &options)?;
            let json = layout.to_json(args.pretty).map_err(HeadlessError::from)?;
            println!("{json}");
            Ok(())
        }
        Command::Render => {
            let options = chart_options(&args, &loaded.people);
            let (layout, svg) = orgchart::render::relayout_and_render_svg(
                &loaded.people,
                &loaded.hierarchy,
                &options,
                &svg_options(&args, input),
            )?;
            let format = match args.render_format {
                RenderFormat::Svg => return write_text(&svg, args.out.as_deref()),
                RenderFormat::Png => ExportFormat::Png,
                RenderFormat::Pdf => ExportFormat::Pdf,
            };
            let raster_options = RasterOptions {
                background: args.background.clone(),
                ..RasterOptions::default()
            };
            let chart = raster::render_layout(layout, &svg, &raster_options)?;
            let out = args
                .out
                .as_deref()
                .map(PathBuf::from)
                .unwrap_or_else(|| default_out_path(input, format.extension()));
            export::export_chart(&chart, &out, format)?;
            Ok(())
        }
        Command::Colors => Ok(()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("ORGCHART_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing();

    match run(args) {
        Ok(()) => {}
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) if err.is_empty_selection() => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
