//! Data tool implementations
//!
//! The five capabilities the model can call over tabular data, and the
//! [`DataToolExecutor`] that routes actions to them.
//!
//! | Tool | Module | Returns |
//! |------|--------|---------|
//! | `load_dataframe` | [`io`] | new DataFrame ID |
//! | `save_dataframe` | [`io`] | `saved: {path}` |
//! | `describe_dataframe` | [`stats`] | summary text |
//! | `plot_time_series` | [`viz`] | SVG path |
//! | `detect_anomalies_iqr` | [`anomaly`] | `(new_id, count)` |

pub mod anomaly;
pub mod dataframe;
pub mod io;
pub mod matlab;
pub mod stats;
pub mod store;
pub mod viz;

mod executor;

pub use dataframe::{Cell, ColumnKind, DataFrame};
pub use executor::DataToolExecutor;
pub use store::DataFrameStore;

use tsagent_domain::ToolSpec;

/// Create the tool specification with all data tools, in prompt order
pub fn default_tool_spec() -> ToolSpec {
    ToolSpec::new()
        .register(io::load_dataframe_definition())
        .register(stats::describe_dataframe_definition())
        .register(viz::plot_time_series_definition())
        .register(anomaly::detect_anomalies_iqr_definition())
        .register(io::save_dataframe_definition())
}
