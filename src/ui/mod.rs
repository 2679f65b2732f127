pub mod campaigns;
pub mod kpi;
pub mod panels;
pub mod plot;
pub mod streaming;
