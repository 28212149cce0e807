pub mod csv_export;
pub mod report_service;

pub use csv_export::products_csv;
pub use report_service::ReportService;
