#![cfg(feature = "raster")]

use orgchart::render::ColorStyle;
use orgchart::render::export::ExportFormat;
use orgchart::render::session::{ChartSession, SessionError};
use orgchart::{ColumnRules, DepartmentFilter, Error, Rgb, SettingsStore};
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture(name: &str) -> PathBuf {
    workspace_root().join("fixtures").join("orgchart").join(name)
}

fn session_in(dir: &Path) -> ChartSession {
    ChartSession::new(SettingsStore::new(dir.join("settings.json")))
}

fn loaded(dir: &Path) -> ChartSession {
    let mut session = session_in(dir);
    session.load_path(fixture("basic.csv")).expect("load basic.csv");
    session
}

#[test]
fn load_renders_the_sample_chart() {
    let dir = tempfile::tempdir().unwrap();
    let session = loaded(dir.path());
    let chart = session.rendered().expect("rendered");
    assert_eq!((chart.width(), chart.height()), (730, 354));
    assert_eq!(chart.scale(), 1.0);
    assert_eq!(session.hierarchy().roots(), ["u1"]);
    assert_eq!(session.hierarchy().children("u1"), ["u2", "u3"]);
    assert_eq!(chart.bboxes().count(), 3);
    assert_eq!(session.status(), "People: 3 | Roots: 1 | Scale: 100%");
    assert_eq!(session.departments(), vec!["Eng"]);
}

#[test]
fn png_export_round_trips_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let session = loaded(dir.path());
    let out = dir.path().join("chart.png");
    session.export(&out, ExportFormat::Png).expect("export png");

    let decoded = image::open(&out).expect("decode png").to_rgba8();
    assert_eq!(&decoded, session.rendered().expect("rendered").image());
}

#[test]
fn pdf_export_writes_a_single_page_document() {
    let dir = tempfile::tempdir().unwrap();
    let session = loaded(dir.path());
    let out = dir.path().join("chart.pdf");
    session.export(&out, ExportFormat::Pdf).expect("export pdf");
    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    // 730x354 px at 300 DPI, in points.
    let [x0, y0, x1, y1] = media_box(&bytes);
    assert_eq!((x0, y0), (0.0, 0.0));
    assert!((x1 - 730.0 * 72.0 / 300.0).abs() < 0.01, "{x1}");
    assert!((y1 - 354.0 * 72.0 / 300.0).abs() < 0.01, "{y1}");
}

fn media_box(pdf: &[u8]) -> [f64; 4] {
    let text = String::from_utf8_lossy(pdf);
    let start = text.find("/MediaBox").expect("MediaBox entry") + "/MediaBox".len();
    let rest = &text[start..];
    let open = rest.find('[').expect("[");
    let close = rest.find(']').expect("]");
    let nums: Vec<f64> = rest[open + 1..close]
        .split_whitespace()
        .map(|n| n.parse().expect("number"))
        .collect();
    nums.try_into().expect("four numbers")
}

#[test]
fn export_to_missing_directory_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let session = loaded(dir.path());
    let out = dir.path().join("missing").join("chart.png");
    let err = session.export(&out, ExportFormat::Png).unwrap_err();
    assert!(err.to_string().contains("chart.png"), "{err}");
    assert!(session.rendered().is_some());
}

#[test]
fn fast_preview_zoom_keeps_the_authoritative_render() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = loaded(dir.path());
    let before = session.rendered().expect("rendered").layout().clone();

    session.zoom(1.5).expect("zoom");
    let preview = session.preview().expect("preview");
    assert_eq!((preview.width(), preview.height()), (1095, 531));
    assert_eq!(preview.source_scale(), 1.0);
    assert_eq!(session.rendered().expect("rendered").layout(), &before);

    // Without fast preview the zoom is an authoritative relayout.
    session.set_fast_preview(false);
    session.zoom(0.5).expect("zoom");
    assert!(session.preview().is_none());
    let chart = session.rendered().expect("rendered");
    assert_eq!(chart.scale(), 0.5);
    assert_eq!((chart.width(), chart.height()), (365, 177));

    session.zoom(9.0).expect("zoom");
    assert_eq!(session.rendered().expect("rendered").scale(), 2.0);
}

#[test]
fn empty_department_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = loaded(dir.path());
    let before = session.rendered().expect("rendered").layout().clone();

    let err = session
        .set_department(DepartmentFilter::Only("Legal".to_string()))
        .unwrap_err();
    assert!(matches!(
        err.data_error(),
        Some(Error::EmptySelection { department }) if department == "Legal"
    ));
    assert_eq!(session.filter(), &DepartmentFilter::All);
    assert_eq!(session.people().len(), 3);
    assert_eq!(session.rendered().expect("rendered").layout(), &before);
}

#[test]
fn department_filter_orphans_become_roots() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(dir.path());
    session.load_path(fixture("company.csv")).expect("load");
    session
        .set_department(DepartmentFilter::parse("Teknoloji"))
        .expect("filter");
    assert_eq!(session.hierarchy().roots(), ["cto"]);
    assert_eq!(session.people().len(), 4);
    assert!(session.status().ends_with(" | Department: Teknoloji"));
}

#[test]
fn search_highlights_and_centers_the_match() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = loaded(dir.path());
    assert_eq!(session.search("car").expect("search"), Some("u3".to_string()));
    let chart = session.rendered().expect("rendered");
    assert!(chart.layout().node("u3").expect("u3").highlighted);

    let f = session.center_fractions("u3", 200, 100).expect("fractions");
    assert!((f.x - 436.0 / 530.0).abs() < 1e-9, "{f:?}");
    assert!((f.y - 216.0 / 254.0).abs() < 1e-9, "{f:?}");
    assert!(session.center_fractions("nobody", 200, 100).is_none());

    assert_eq!(session.search("zed").expect("search"), None);
    session.clear_highlight().expect("clear");
    assert!(
        !session
            .rendered()
            .expect("rendered")
            .layout()
            .node("u3")
            .expect("u3")
            .highlighted
    );
}

#[test]
fn title_colors_persist_through_the_settings_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = loaded(dir.path());
    assert_eq!(session.pick_color("Lead"), Rgb::DEFAULT_PICK);

    session
        .set_title_color("Lead", Rgb(20, 40, 120))
        .expect("set color");
    session.set_color_style(ColorStyle::Stripe).expect("style");
    let legend = session
        .rendered()
        .expect("rendered")
        .layout()
        .legend
        .clone()
        .expect("legend");
    assert_eq!(legend.items.len(), 1);
    session.save_colors().expect("save");

    let mut other = loaded(dir.path());
    assert_eq!(other.title_colors().get("Lead"), Some(Rgb(20, 40, 120)));
    other.clear_colors().expect("clear");
    assert!(other.rendered().expect("rendered").layout().legend.is_none());
    other.load_colors().expect("reload");
    assert_eq!(other.pick_color("Lead"), Rgb(20, 40, 120));
}

#[test]
fn start_from_limits_rendered_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = loaded(dir.path());
    session.set_start_from(Some("u2")).expect("start");
    let chart = session.rendered().expect("rendered");
    assert_eq!(chart.bboxes().map(|(u, _)| u).collect::<Vec<_>>(), vec!["u2"]);
    assert!(session.status().contains(" | Start: u2"));
    session.set_start_from(None).expect("reset");
    assert_eq!(session.rendered().expect("rendered").bboxes().count(), 3);
}

#[test]
fn cyclic_table_is_rejected_without_touching_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = loaded(dir.path());
    let err = session.load_path(fixture("cycle.csv")).unwrap_err();
    let Some(Error::Cycle(cycle)) = err.data_error() else {
        panic!("expected cycle, got {err:?}");
    };
    assert_eq!(cycle.members, vec!["a", "b"]);
    assert_eq!(session.people().len(), 3);
    assert!(session.source().is_some_and(|p| p.ends_with("basic.csv")));
}

#[test]
fn missing_columns_fail_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session_in(dir.path());
    let err = session.load_path(fixture("missing_columns.csv")).unwrap_err();
    assert!(matches!(err, SessionError::Data(Error::Schema(_))), "{err:?}");
    assert!(session.rendered().is_none());
    assert!(matches!(session.relayout(), Err(SessionError::NoData)));
}

#[test]
fn rendering_twice_yields_identical_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = loaded(dir.path());
    let first = session.rendered().expect("rendered").image().clone();
    session.relayout().expect("relayout");
    assert_eq!(session.rendered().expect("rendered").image(), &first);

    let other = loaded(dir.path());
    assert_eq!(other.rendered().expect("rendered").image(), &first);
}

#[test]
fn legend_toggle_and_color_unset_redraw_the_chart() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = loaded(dir.path());
    session
        .set_title_color("Lead", Rgb(20, 40, 120))
        .expect("set lead");
    session
        .set_title_color("Dev", Rgb(250, 220, 120))
        .expect("set dev");
    let legend_of = |s: &ChartSession| s.rendered().expect("rendered").layout().legend.clone();
    let titles = |s: &ChartSession| -> Vec<String> {
        legend_of(s)
            .map(|l| l.items.into_iter().map(|i| i.title).collect())
            .unwrap_or_default()
    };
    assert_eq!(titles(&session), vec!["Dev", "Lead"]);
    let with_legend = session.rendered().expect("rendered").width();

    session.set_legend(false).expect("hide legend");
    assert!(legend_of(&session).is_none());
    assert_eq!(session.rendered().expect("rendered").width(), with_legend - 260);

    session.set_legend(true).expect("show legend");
    session.unset_title_color("Dev").expect("unset dev");
    assert_eq!(titles(&session), vec!["Lead"]);
    assert_eq!(session.pick_color("Dev"), Rgb::DEFAULT_PICK);
    assert_eq!(session.title_colors().get("Lead"), Some(Rgb(20, 40, 120)));
}

#[test]
fn custom_column_rules_apply_to_loaded_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("staff.csv");
    std::fs::write(
        &path,
        "Kennung,Name,Abteilung,Funktion,Vorgesetzter,Mail\n\
         k1,Anna,IT,Leitung,,anna@x\n\
         k2,Ben,IT,Entwickler,k1,ben@x\n",
    )
    .unwrap();

    let rules = ColumnRules::default().with_overrides(
        ColumnRules::from_json_str(
            r#"[
                { "field": "user_id", "match": { "exact": ["kennung"] } },
                { "field": "department", "match": { "any_of": ["abteilung"] } },
                { "field": "title", "match": { "any_of": ["funktion"] } },
                { "field": "manager", "match": { "any_of": ["vorgesetzter"] } }
            ]"#,
        )
        .expect("rules"),
    );
    let mut session = session_in(dir.path()).with_rules(rules);
    session.load_path(&path).expect("load");
    assert_eq!(session.hierarchy().roots(), ["k1"]);
    let ben = session.person("k2").expect("k2");
    assert_eq!(ben.full_name, "Ben");
    assert_eq!(ben.manager.as_deref(), Some("k1"));
    assert!(session.person("nobody").is_none());
}
