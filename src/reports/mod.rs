// Reports module - turns projection sets into renderer-agnostic documents

pub mod builder;
pub mod document;

pub use builder::{build_report, build_report_with, round_display, ChartLayout, ReportOptions};
pub use document::{
    Cell, ChartSeries, ChartSpec, ReportDocument, ReportMetadata, Row, Table, TableKind,
};
