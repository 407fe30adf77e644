pub mod chart;
pub mod param;
pub mod plan;
pub mod schema;

pub use chart::{ChartKind, ChartSpec};
pub use param::{ParamValue, SweepAxis};
pub use plan::{Combination, ExperimentPlan, MetricSpec, PlanError, SchemaRef};
pub use schema::{FieldKind, FieldSpec, ResultSchema};
