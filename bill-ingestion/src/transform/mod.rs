use bill_client::domain::BillRecord;
use time::Date;

use crate::config::ExtractConfig;
use crate::pipeline::{Envelope, PipelineError, Transform};

/// Pure validation of a `BillRecord`.
///
/// Rules:
/// - date must not precede the cutoff.
/// - usage and cost must be finite and non-negative.
/// - subtotals, when present, must be finite and non-negative.
pub fn validate_bill(bill: &BillRecord, cutoff: Date) -> Result<(), PipelineError> {
    if bill.date < cutoff {
        return Err(PipelineError::Transform(format!("{}: dated {} before cutoff {cutoff}", bill.filename, bill.date)));
    }

    let required = [
        ("electricUsage", bill.electric_usage),
        ("electricCost", bill.electric_cost),
        ("gasUsage", bill.gas_usage),
        ("gasCost", bill.gas_cost),
    ];
    for (field, value) in required {
        if !value.is_finite() || value < 0.0 {
            return Err(PipelineError::Transform(format!("{}: {field} must be non-negative", bill.filename)));
        }
    }

    let optional = [
        ("electricSupply", bill.electric_supply),
        ("electricDelivery", bill.electric_delivery),
        ("gasSupply", bill.gas_supply),
        ("gasDelivery", bill.gas_delivery),
    ];
    for (field, value) in optional {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(PipelineError::Transform(format!("{}: {field} must be non-negative", bill.filename)));
            }
        }
    }

    Ok(())
}

/// Applies [`validate_bill`] to plain and enriched records alike.
#[derive(Debug, Clone, Copy)]
pub struct BillValidation {
    cutoff: Date,
}

impl BillValidation {
    pub fn new(cutoff: Date) -> Self {
        Self { cutoff }
    }
}

impl Default for BillValidation {
    fn default() -> Self {
        Self::new(ExtractConfig::default().cutoff_date)
    }
}

#[async_trait::async_trait]
impl<R> Transform<R, R> for BillValidation
where
    R: AsRef<BillRecord> + Send + 'static,
{
    async fn apply(&self, input: Envelope<R>) -> Result<Envelope<R>, PipelineError> {
        match validate_bill(input.payload.as_ref(), self.cutoff) {
            Ok(()) => Ok(input),
            Err(e) => {
                metrics::counter!("validation_bill_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}
