//! Totals over income and expense records.

use crate::domain::{FinanceKind, FinancialRecord};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinanceSummary {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub balance_cents: i64,
    /// Signed: income positive, expenses negative.
    pub by_category: BTreeMap<String, i64>,
}

pub fn summarize(records: &[FinancialRecord]) -> FinanceSummary {
    let mut summary = FinanceSummary::default();
    for r in records {
        let signed = match r.kind {
            FinanceKind::Income => {
                summary.income_cents += r.amount_cents;
                r.amount_cents
            }
            FinanceKind::Expense => {
                summary.expense_cents += r.amount_cents;
                -r.amount_cents
            }
        };
        *summary.by_category.entry(r.category.clone()).or_default() += signed;
    }
    summary.balance_cents = summary.income_cents - summary.expense_cents;
    summary
}
