pub mod job_row;
pub mod jurisdiction;
pub mod outcome;
pub mod sheet_range;

pub use job_row::{find_resume_point, JobRow, RowUpdate};
pub use jurisdiction::{load_jurisdiction_records, JurisdictionRecord};
pub use outcome::AutomationOutcome;
pub use sheet_range::{cell_range, column_letter, row_range};
