use orgchart_core::{DepartmentFilter, Hierarchy, PersonRepository, Rgb, load_table};
use orgchart_render::{ChartOptions, ColorStyle, SvgRenderOptions, layout_chart, render_chart_svg};
use std::path::PathBuf;

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn basic_svg(options: &ChartOptions) -> String {
    let path = workspace_root()
        .join("fixtures")
        .join("orgchart")
        .join("basic.csv");
    let table = load_table(&path).expect("fixture loads");
    let people = PersonRepository::build(&table, &DepartmentFilter::All);
    let h = Hierarchy::build(&people);
    let layout = layout_chart(&people, &h, options).expect("chart ok");
    render_chart_svg(&layout, &SvgRenderOptions::default())
}

#[test]
fn svg_has_one_group_per_node_and_a_connector_per_edge() {
    let svg = basic_svg(&ChartOptions::default());
    assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg""#));
    assert!(svg.contains(r#"viewBox="0 0 730 354""#));
    assert_eq!(svg.matches(r#"<g class="node""#).count(), 3);
    assert_eq!(svg.matches("<polyline").count(), 2);
    assert!(svg.contains(r#"data-username="u3""#));
    assert!(svg.contains(">Dev  |  Eng</text>"));
    assert!(svg.contains(">cara@example.com</text>"));
    assert!(!svg.contains(r#"class="highlight""#));
    assert!(!svg.contains(r#"class="legend""#));
    assert!(svg.ends_with("</svg>"));
}

#[test]
fn svg_draws_highlight_stripe_and_legend() {
    let options = ChartOptions {
        highlight: Some("u1".to_string()),
        color_style: ColorStyle::Stripe,
        title_colors: [("Lead".to_string(), Rgb(0x12, 0x34, 0x56))]
            .into_iter()
            .collect(),
        ..ChartOptions::default()
    };
    let svg = basic_svg(&options);
    assert_eq!(svg.matches(r#"class="highlight""#).count(), 1);
    assert!(svg.contains(r##"stroke="#dc3545""##));
    assert_eq!(svg.matches(r#"class="stripe""#).count(), 1);
    assert!(svg.contains(r##"fill="#123456""##));
    assert!(svg.contains(r#"class="legend""#));
    assert!(svg.contains(">Title Colors</text>"));
    assert!(svg.contains(">Lead</text>"));
}

#[test]
fn svg_output_is_deterministic() {
    let options = ChartOptions::default();
    assert_eq!(basic_svg(&options), basic_svg(&options));
}
