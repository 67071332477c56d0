pub mod component;
pub mod expression;
pub mod predicate;
pub mod sdk;
pub mod surface;
pub mod visualization;

pub use component::{ChartSettings, ChartStatus, SensorInputChanges, SensorInputs, TsiChart};
pub use expression::{AggregateExpression, SensorCategory, TimeWindow};
pub use predicate::build_predicate_string;
pub use sdk::{ChartSdk, LineChart, RenderOptions, TsiSdk};
pub use surface::{ChartSurface, ChartSurfaces, RenderedChart};
pub use visualization::{transform_aggregates_for_visualization, VisualizationData};
