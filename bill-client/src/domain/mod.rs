pub mod bill_record;
pub mod enriched_bill_record;
pub mod iso_date;

pub use bill_record::{BillRecord, Fuel};
pub use enriched_bill_record::{EnrichedBillRecord, WindowMean};
