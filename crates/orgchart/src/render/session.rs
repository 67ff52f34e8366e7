//! Interactive chart state without a GUI toolkit.
//!
//! A [`ChartSession`] owns the loaded table, the active filter and options, and the last
//! authoritative render. Every state change that affects geometry rebuilds the whole chart; the
//! new state is committed only when the rebuild succeeds.

use crate::render::export::{self, ExportError, ExportFormat};
use crate::render::raster::{
    self, PreviewImage, RasterError, RasterOptions, RenderedChart, approximate_rescale,
};
use crate::render::{ChartOptions, ColorStyle, HeadlessError, SvgRenderOptions};
use orgchart_core::{
    ColumnRules, DepartmentFilter, Hierarchy, NormalizedTable, Person, PersonRepository, Rgb,
    Settings, SettingsIoError, SettingsStore, TitleColors, load_table_with_rules, select_people,
};
use std::path::{Path, PathBuf};

/// Zoom range offered to interactive callers.
pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 2.0;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Data(#[from] orgchart_core::Error),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Settings(#[from] SettingsIoError),
    #[error("no table loaded")]
    NoData,
    #[error("nothing rendered yet")]
    NoChart,
}

impl From<HeadlessError> for SessionError {
    fn from(err: HeadlessError) -> Self {
        Self::Raster(RasterError::Headless(err))
    }
}

impl SessionError {
    /// The underlying data error, when there is one (e.g. `EmptySelection` or a cycle).
    pub fn data_error(&self) -> Option<&orgchart_core::Error> {
        match self {
            Self::Data(err) => Some(err),
            Self::Raster(RasterError::Headless(HeadlessError::Data(err))) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Scroll position that centers a node in a viewport, as fractions of the scrollable range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollFractions {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug)]
pub struct ChartSession {
    settings_store: SettingsStore,
    settings: Settings,
    rules: ColumnRules,
    source: Option<PathBuf>,
    table: Option<NormalizedTable>,
    filter: DepartmentFilter,
    people: PersonRepository,
    hierarchy: Hierarchy,
    options: ChartOptions,
    svg: SvgRenderOptions,
    raster: RasterOptions,
    rendered: Option<RenderedChart>,
    preview: Option<PreviewImage>,
    fast_preview: bool,
}

struct Built {
    people: PersonRepository,
    hierarchy: Hierarchy,
    rendered: RenderedChart,
}

impl ChartSession {
    /// New session; title colors are read from `settings_store` (a broken file only warns).
    pub fn new(settings_store: SettingsStore) -> Self {
        let settings = settings_store.load();
        let options = ChartOptions {
            title_colors: settings.title_colors.clone(),
            ..ChartOptions::default()
        };
        Self {
            settings_store,
            settings,
            rules: ColumnRules::default(),
            source: None,
            table: None,
            filter: DepartmentFilter::All,
            people: PersonRepository::default(),
            hierarchy: Hierarchy::default(),
            options,
            svg: SvgRenderOptions::default(),
            raster: RasterOptions::default(),
            rendered: None,
            preview: None,
            fast_preview: true,
        }
    }

    pub fn with_rules(mut self, rules: ColumnRules) -> Self {
        self.rules = rules;
        self
    }

    /// Loads a spreadsheet/CSV file and renders it with the filter and root override reset.
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let table = load_table_with_rules(path, &self.rules)?;
        self.load_table(table)?;
        self.source = Some(path.to_path_buf());
        Ok(())
    }

    pub fn load_table(&mut self, table: NormalizedTable) -> Result<()> {
        let mut options = self.options.clone();
        options.start_from = None;
        options.highlight = None;
        let built = self.build(&table, &DepartmentFilter::All, &options)?;
        self.table = Some(table);
        self.source = None;
        self.filter = DepartmentFilter::All;
        self.options = options;
        self.commit(built);
        Ok(())
    }

    /// Switches the department filter. An empty selection leaves the current chart, filter and
    /// people untouched.
    pub fn set_department(&mut self, filter: DepartmentFilter) -> Result<()> {
        let table = self.table.as_ref().ok_or(SessionError::NoData)?;
        let built = self.build(table, &filter, &self.options)?;
        self.filter = filter;
        self.commit(built);
        Ok(())
    }

    /// Draws only the subtree under `username`; `None` (or an unknown name) draws all roots.
    pub fn set_start_from(&mut self, username: Option<&str>) -> Result<()> {
        self.update_options(|o| o.start_from = username.map(str::to_string))
    }

    /// Authoritative relayout with the current state.
    pub fn relayout(&mut self) -> Result<()> {
        let table = self.table.as_ref().ok_or(SessionError::NoData)?;
        let built = self.build(table, &self.filter, &self.options)?;
        self.commit(built);
        Ok(())
    }

    pub fn set_fast_preview(&mut self, enabled: bool) {
        self.fast_preview = enabled;
    }

    pub fn fast_preview(&self) -> bool {
        self.fast_preview
    }

    /// Changes the zoom (clamped to [`MIN_SCALE`]..=[`MAX_SCALE`]). With fast preview on and a
    /// render available, only a resampled preview is produced; otherwise the chart is relaid out.
    pub fn zoom(&mut self, scale: f64) -> Result<()> {
        let scale = if scale.is_finite() {
            scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        };
        if self.fast_preview {
            if let Some(rendered) = &self.rendered {
                self.preview = Some(approximate_rescale(rendered, scale / rendered.scale()));
                self.options.scale = scale;
                return Ok(());
            }
        }
        self.update_options(|o| o.scale = scale)
    }

    /// Highlights the first person whose username or name contains `query` and relays out.
    /// Returns the matched username.
    pub fn search(&mut self, query: &str) -> Result<Option<String>> {
        let Some(found) = self.people.search(query).map(|p| p.username.clone()) else {
            return Ok(None);
        };
        self.update_options(|o| o.highlight = Some(found.clone()))?;
        Ok(Some(found))
    }

    pub fn clear_highlight(&mut self) -> Result<()> {
        self.update_options(|o| o.highlight = None)
    }

    pub fn set_show_department(&mut self, show: bool) -> Result<()> {
        self.update_options(|o| o.show_department = show)
    }

    pub fn set_show_mail(&mut self, show: bool) -> Result<()> {
        self.update_options(|o| o.show_mail = show)
    }

    pub fn set_color_style(&mut self, style: ColorStyle) -> Result<()> {
        self.update_options(|o| o.color_style = style)
    }

    pub fn set_legend(&mut self, legend: bool) -> Result<()> {
        self.update_options(|o| o.legend = legend)
    }

    /// Color preselected by a picker for `title`.
    pub fn pick_color(&self, title: &str) -> Rgb {
        self.options
            .title_colors
            .get(title)
            .unwrap_or(Rgb::DEFAULT_PICK)
    }

    pub fn set_title_color(&mut self, title: &str, color: Rgb) -> Result<()> {
        self.update_options(|o| o.title_colors.set(title, color))
    }

    pub fn unset_title_color(&mut self, title: &str) -> Result<()> {
        self.update_options(|o| {
            o.title_colors.remove(title);
        })
    }

    pub fn clear_colors(&mut self) -> Result<()> {
        self.update_options(|o| o.title_colors.clear())
    }

    /// Persists the current title colors (other settings keys are kept).
    pub fn save_colors(&mut self) -> Result<()> {
        let mut settings = self.settings.clone();
        settings.title_colors = self.options.title_colors.clone();
        self.settings_store.save(&settings)?;
        self.settings = settings;
        Ok(())
    }

    /// Reloads title colors from the settings store and redraws.
    pub fn load_colors(&mut self) -> Result<()> {
        let settings = self.settings_store.load();
        let colors = settings.title_colors.clone();
        self.settings = settings;
        self.update_options(|o| o.title_colors = colors)
    }

    pub fn export(&self, path: impl AsRef<Path>, format: ExportFormat) -> Result<()> {
        let rendered = self.rendered.as_ref().ok_or(SessionError::NoChart)?;
        export::export_chart(rendered, path.as_ref(), format)?;
        Ok(())
    }

    /// Scroll fractions that center `username` in a `view_w`×`view_h` viewport over the image
    /// currently on screen (the preview when one exists).
    pub fn center_fractions(
        &self,
        username: &str,
        view_w: u32,
        view_h: u32,
    ) -> Option<ScrollFractions> {
        let rendered = self.rendered.as_ref()?;
        let bbox = rendered.bbox(username)?;
        let (shown_w, shown_h) = match &self.preview {
            Some(p) => (p.width(), p.height()),
            None => (rendered.width(), rendered.height()),
        };
        let ratio_x = f64::from(shown_w) / f64::from(rendered.width().max(1));
        let ratio_y = f64::from(shown_h) / f64::from(rendered.height().max(1));
        let center = bbox.center();
        let cx = center.x as f64 * ratio_x;
        let cy = center.y as f64 * ratio_y;

        let view_w = f64::from(view_w.max(1));
        let view_h = f64::from(view_h.max(1));
        let target_x = (cx - view_w / 2.0).max(0.0);
        let target_y = (cy - view_h / 2.0).max(0.0);
        let frac_x = target_x / (f64::from(shown_w) - view_w).max(1.0);
        let frac_y = target_y / (f64::from(shown_h) - view_h).max(1.0);
        Some(ScrollFractions {
            x: frac_x.clamp(0.0, 1.0),
            y: frac_y.clamp(0.0, 1.0),
        })
    }

    /// One-line summary: people, roots, zoom, start node and department.
    pub fn status(&self) -> String {
        let mut info = format!(
            "People: {} | Roots: {} | Scale: {}%",
            self.people.len(),
            self.hierarchy.roots().len(),
            (self.options.scale * 100.0).round() as i64
        );
        let start = self
            .options
            .start_from
            .as_deref()
            .filter(|s| self.people.contains(s));
        if let Some(start) = start {
            info.push_str(&format!(" | Start: {start}"));
        }
        if let Some(dept) = self.filter.department() {
            info.push_str(&format!(" | Department: {dept}"));
        }
        info
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn table(&self) -> Option<&NormalizedTable> {
        self.table.as_ref()
    }

    pub fn filter(&self) -> &DepartmentFilter {
        &self.filter
    }

    pub fn people(&self) -> &PersonRepository {
        &self.people
    }

    pub fn person(&self, username: &str) -> Option<&Person> {
        self.people.get(username)
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    pub fn title_colors(&self) -> &TitleColors {
        &self.options.title_colors
    }

    pub fn rendered(&self) -> Option<&RenderedChart> {
        self.rendered.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewImage> {
        self.preview.as_ref()
    }

    /// Department pick list, sorted and distinct.
    pub fn departments(&self) -> Vec<String> {
        self.table.as_ref().map(|t| t.departments()).unwrap_or_default()
    }

    /// Titles for the color editor, sorted and distinct.
    pub fn titles(&self) -> Vec<String> {
        self.table.as_ref().map(|t| t.titles()).unwrap_or_default()
    }

    /// `(username, full name)` root choices in table order.
    pub fn user_choices(&self) -> Vec<(String, String)> {
        self.table.as_ref().map(|t| t.user_choices()).unwrap_or_default()
    }

    fn update_options(&mut self, apply: impl FnOnce(&mut ChartOptions)) -> Result<()> {
        let mut options = self.options.clone();
        apply(&mut options);
        let Some(table) = self.table.as_ref() else {
            self.options = options;
            return Ok(());
        };
        let built = self.build(table, &self.filter, &options)?;
        self.options = options;
        self.commit(built);
        Ok(())
    }

    fn build(
        &self,
        table: &NormalizedTable,
        filter: &DepartmentFilter,
        options: &ChartOptions,
    ) -> Result<Built> {
        let people = select_people(table, filter)?;
        let hierarchy = Hierarchy::build(&people);
        let rendered =
            raster::relayout_and_render(&people, &hierarchy, options, &self.svg, &self.raster)?;
        Ok(Built {
            people,
            hierarchy,
            rendered,
        })
    }

    fn commit(&mut self, built: Built) {
        self.people = built.people;
        self.hierarchy = built.hierarchy;
        self.rendered = Some(built.rendered);
        self.preview = None;
        tracing::info!(status = %self.status(), "chart updated");
    }
}
