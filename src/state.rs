use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::data::aggregate::{Aggregate, distinct_count, value_counts};
use crate::data::cache::DatasetCache;
use crate::data::error::{DataError, DataResult};
use crate::data::export::export_file;
use crate::data::filter::{FilterState, filtered_indices};
use crate::data::loader::{FileFormat, load_bytes, load_file};
use crate::data::model::Dataset;
use crate::data::search::SearchIndex;

// ---------------------------------------------------------------------------
// Where the current dataset came from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// The configured default file, served through the cache.
    Default(PathBuf),
    /// A user-supplied file or dropped buffer.
    Upload { name: String, format: FileFormat },
}

impl DataSource {
    pub fn format(&self) -> FileFormat {
        match self {
            DataSource::Default(path) => FileFormat::from_path(path).unwrap_or_default(),
            DataSource::Upload { format, .. } => *format,
        }
    }

    pub fn label(&self) -> String {
        match self {
            DataSource::Default(path) => path.display().to_string(),
            DataSource::Upload { name, .. } => name.clone(),
        }
    }
}

/// Headline numbers above the table. A `None` count means the column is not
/// in the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub records: usize,
    pub distinct: Vec<(String, Option<usize>)>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. Every mutating method
/// recomputes the filtered view from scratch.
pub struct AppState {
    pub config: AppConfig,

    /// Cached default dataset; uploads bypass it.
    cache: DatasetCache,

    /// Loaded dataset (None until something loads).
    pub dataset: Option<Arc<Dataset>>,

    pub source: Option<DataSource>,

    /// Search box, search columns and per-column selections.
    pub filters: FilterState,

    search_index: SearchIndex,

    /// Indices of records passing the current filters.
    pub visible_indices: Vec<usize>,

    /// Columns that get a bar chart.
    pub chart_columns: Vec<String>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cache: DatasetCache::new(),
            dataset: None,
            source: None,
            filters: FilterState::default(),
            search_index: SearchIndex::default(),
            visible_indices: Vec::new(),
            chart_columns: Vec::new(),
            status_message: None,
        }
    }

    // -- loading --

    /// Show the default dataset, reading it only if the cache is cold or the
    /// file changed.
    pub fn load_default(&mut self) {
        let path = self.config.data.default_path.clone();
        let rules = self.config.normalize_rules();
        match self.cache.get(&path, &rules) {
            Ok(dataset) => self.set_dataset(dataset, DataSource::Default(path)),
            Err(DataError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("default dataset {} not found", path.display());
                self.status_message = Some(format!(
                    "No dataset at {}. Open a file to get started.",
                    path.display()
                ));
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Forget the cached default dataset and read it again.
    pub fn reload_default(&mut self) {
        self.cache.invalidate();
        self.load_default();
    }

    /// Replace the dataset with a user-chosen file. On failure the current
    /// dataset stays.
    pub fn open_path(&mut self, path: &Path) {
        let rules = self.config.normalize_rules();
        let loaded = FileFormat::from_path(path).and_then(|format| {
            load_file(path, &rules).map(|ds| (ds, format))
        });
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.finish_upload(name, loaded);
    }

    /// Replace the dataset with an uploaded buffer (e.g. a dropped file).
    pub fn open_bytes(&mut self, name: &str, bytes: &[u8]) {
        let rules = self.config.normalize_rules();
        let format = FileFormat::from_path(Path::new(name)).unwrap_or_default();
        let loaded = load_bytes(name, bytes, &rules).map(|ds| (ds, format));
        self.finish_upload(name.to_string(), loaded);
    }

    fn finish_upload(
        &mut self,
        name: String,
        loaded: DataResult<(Dataset, FileFormat)>,
    ) {
        match loaded {
            Ok((dataset, format)) => {
                log::info!(
                    "Loaded {} records with columns {:?} from {name}",
                    dataset.len(),
                    dataset.columns()
                );
                self.set_dataset(Arc::new(dataset), DataSource::Upload { name, format });
            }
            Err(e) => {
                log::error!("Failed to load {name}: {e}");
                self.status_message = Some(format!("Error loading {name}: {e}"));
            }
        }
    }

    /// Ingest a newly loaded dataset, initialise filters and charts.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>, source: DataSource) {
        self.chart_columns = self
            .config
            .columns
            .default_charts
            .iter()
            .filter(|c| dataset.has_column(c))
            .cloned()
            .collect();
        self.dataset = Some(dataset);
        self.source = Some(source);
        self.status_message = None;
        self.reset_filters();
    }

    // -- recomputation --

    fn rebuild_search_index(&mut self) {
        if let Some(ds) = &self.dataset {
            self.search_index = SearchIndex::build(ds, &self.filters.search_columns);
        }
    }

    /// Recompute `visible_indices` after any filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.search_index, &self.filters);
        }
    }

    // -- filter controls --

    pub fn set_query(&mut self, query: &str) {
        self.filters.query = query.to_string();
        self.refilter();
    }

    /// Add or remove a column from the searched text.
    pub fn toggle_search_column(&mut self, column: &str) {
        let cols = &mut self.filters.search_columns;
        if let Some(pos) = cols.iter().position(|c| c == column) {
            cols.remove(pos);
        } else {
            cols.push(column.to_string());
        }
        self.rebuild_search_index();
        self.refilter();
    }

    /// Toggle a single label in a column's allowed set.
    pub fn toggle_filter_value(&mut self, column: &str, label: &str) {
        let selected = self.filters.categories.entry(column.to_string()).or_default();
        if !selected.remove(label) {
            selected.insert(label.to_string());
        }
        self.refilter();
    }

    /// Select all labels in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all) = self.dataset.as_ref().and_then(|ds| ds.category_labels(column)) {
            self.filters.categories.insert(column.to_string(), all);
            self.refilter();
        }
    }

    /// Deselect all labels in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters
            .categories
            .insert(column.to_string(), Default::default());
        self.refilter();
    }

    /// Back to "no query, everything selected, default search columns".
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filters = FilterState::initial(
                ds,
                &self.config.columns.search,
                &self.config.columns.categorical,
            );
        } else {
            self.filters = FilterState::default();
        }
        self.rebuild_search_index();
        self.refilter();
    }

    pub fn toggle_chart_column(&mut self, column: &str) {
        if let Some(pos) = self.chart_columns.iter().position(|c| c == column) {
            self.chart_columns.remove(pos);
        } else {
            self.chart_columns.push(column.to_string());
        }
    }

    // -- derived views --

    /// Categorical columns present in the dataset, in configured order.
    pub fn categorical_columns(&self) -> Vec<String> {
        self.present(&self.config.columns.categorical)
    }

    /// Chartable columns present in the dataset, in configured order.
    pub fn chartable_columns(&self) -> Vec<String> {
        self.present(&self.config.columns.chartable)
    }

    fn present(&self, names: &[String]) -> Vec<String> {
        match &self.dataset {
            Some(ds) => names.iter().filter(|c| ds.has_column(c)).cloned().collect(),
            None => Vec::new(),
        }
    }

    pub fn summary(&self) -> Summary {
        let distinct = self
            .config
            .columns
            .distinct_metrics
            .iter()
            .map(|col| {
                let count = self
                    .dataset
                    .as_ref()
                    .and_then(|ds| distinct_count(ds, &self.visible_indices, col));
                (col.clone(), count)
            })
            .collect();
        Summary {
            records: self.visible_indices.len(),
            distinct,
        }
    }

    /// One aggregate per chosen chart column. Empty when nothing passes the
    /// filters, so no chart gets drawn.
    pub fn aggregates(&self) -> Vec<Aggregate> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        if self.visible_indices.is_empty() {
            return Vec::new();
        }
        self.chart_columns
            .iter()
            .filter_map(|col| value_counts(ds, &self.visible_indices, col))
            .collect()
    }

    // -- export --

    pub fn export_format(&self) -> FileFormat {
        self.source.as_ref().map(DataSource::format).unwrap_or_default()
    }

    /// Fixed export file name, with the extension of the loaded format.
    pub fn export_file_name(&self) -> String {
        format!(
            "{}.{}",
            self.config.export.file_stem,
            self.export_format().extension()
        )
    }

    /// Write the filtered view to `path` in the loaded format.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        let ds = self.dataset.as_ref().context("no dataset loaded")?;
        export_file(path, ds, &self.visible_indices, self.export_format())
            .with_context(|| format!("exporting to {}", path.display()))
    }
}
