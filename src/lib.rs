//! trace_chart: columnar ingestion and rendering core for an interactive
//! 2-D scatter viewer over very large tab-separated trace files.
//!
//! Three layers: a single-pass streaming loader building type-sniffed
//! columnar storage, an axis-projection layer linearizing up to two columns
//! into one binary-searchable coordinate, and a renderer that keeps an
//! arbitrarily large point set legible under continuous log-scale zoom.

pub mod data_view;
pub mod error;
pub mod events;
pub mod expr;
pub mod loader;
pub mod palette;
pub mod projection;
pub mod render;
pub mod scales;
pub mod schema;
pub mod stream;
pub mod table;
pub mod view_spec;

pub use data_view::DataView;
pub use error::{ExprError, LoadError, RowError, SpecError};
pub use events::{EventBus, EventKind, SharedBus, ViewerEvent};
pub use loader::{CancelToken, LoadObserver, LoadOptions, LoadStatus, LoadTask, TabLoader};
pub use projection::AxisProjector;
pub use render::{CanvasRenderer, ChartTheme, RectBatch, SoftwareBatch, TextSink, ZoomAxis};
pub use table::{Column, ColumnKind, ColumnStats, SharedTable, Table};
pub use view_spec::{AxisColumn, AxisSpec, ViewSpec, ROW_INDEX_FIELD};
