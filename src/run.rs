use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::binding::Binding;
use crate::config::AutofillConfig;
use crate::currency::{CurrencySwitcher, SwitchReport};
use crate::error::Result;
use crate::fill::{FillOutcome, ValueFiller};
use crate::page::Page;
use crate::resolve::FieldResolver;
use crate::workbook;

#[derive(Debug, Serialize)]
pub struct FieldReport {
    pub label: String,
    pub cell: String,
    pub value: String,
    pub outcome: FillOutcome,
}

/// What one run did: the currency pass (when it ran) and every binding's
/// outcome in declared order. Skipped fields count toward the total, not
/// toward the filled tally.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub currency: Option<SwitchReport>,
    pub fields: Vec<FieldReport>,
}

impl RunReport {
    pub fn filled(&self) -> usize {
        self.fields.iter().filter(|f| f.outcome.is_filled()).count()
    }

    pub fn total(&self) -> usize {
        self.fields.len()
    }
}

/// Sequences a run against one page: currency pass, settle, one-shot cell
/// read, then resolve+fill per binding with pacing in between.
pub struct Autofill {
    config: AutofillConfig,
}

impl Autofill {
    pub fn new(config: AutofillConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AutofillConfig {
        &self.config
    }

    /// Full run: switch currencies, let the form settle, fill every binding.
    pub async fn run(
        &self,
        page: &Page,
        workbook_path: &Path,
        bindings: &[Binding],
    ) -> Result<RunReport> {
        let currency = self.switch_currencies(page).await?;
        // Bulk currency changes re-render the form; field positions cannot be
        // trusted until that finishes, and there is no predicate to poll for.
        tokio::time::sleep(self.config.settle_delay).await;

        let fields = self.fill_fields(page, workbook_path, bindings).await?;
        Ok(RunReport {
            currency: Some(currency),
            fields,
        })
    }

    pub async fn switch_currencies(&self, page: &Page) -> Result<SwitchReport> {
        CurrencySwitcher::new(&self.config).switch_all(page).await
    }

    pub async fn fill_fields(
        &self,
        page: &Page,
        workbook_path: &Path,
        bindings: &[Binding],
    ) -> Result<Vec<FieldReport>> {
        let addresses: Vec<String> = bindings
            .iter()
            .map(|b| b.cell.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let values = workbook::read_cells(workbook_path, &addresses)?;

        let mut resolver = FieldResolver::new(self.config.container_selector.as_str());
        let filler = ValueFiller::new(&self.config);

        let mut fields = Vec::with_capacity(bindings.len());
        for (n, binding) in bindings.iter().enumerate() {
            let value = values.get(&binding.cell).cloned().unwrap_or_default();
            let outcome = if value.is_empty() {
                info!(field = n + 1, label = %binding.label, "empty cell, skipped");
                FillOutcome::SkippedEmpty
            } else {
                info!(field = n + 1, label = %binding.label, value = %value, "filling");
                let outcome = match resolver.resolve(page, binding).await {
                    Ok(Some(container)) => filler.fill(page, &container, &value).await,
                    Ok(None) => FillOutcome::NotFound,
                    Err(e) => FillOutcome::ResolveFailed(e.to_string()),
                };
                if !outcome.is_filled() {
                    warn!(label = %binding.label, ?outcome, "field not filled");
                }
                tokio::time::sleep(self.config.pacing_delay).await;
                outcome
            };
            fields.push(FieldReport {
                label: binding.label.clone(),
                cell: binding.cell.clone(),
                value,
                outcome,
            });
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fill::FillStrategy;

    fn field(label: &str, outcome: FillOutcome) -> FieldReport {
        FieldReport {
            label: label.into(),
            cell: "E21".into(),
            value: "1200000".into(),
            outcome,
        }
    }

    #[test]
    fn skipped_fields_count_toward_total_only() {
        let report = RunReport {
            currency: None,
            fields: vec![
                field("Annual Salary", FillOutcome::Filled(FillStrategy::TabOrder)),
                field("Monthly Bonus", FillOutcome::SkippedEmpty),
                field("Annual Bonus", FillOutcome::NotFound),
            ],
        };
        assert_eq!(report.filled(), 1);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn report_serializes_for_the_json_dump() {
        let report = RunReport {
            currency: None,
            fields: vec![field(
                "Annual Salary",
                FillOutcome::Failed {
                    primary: "no combobox".into(),
                    fallback: "no box model".into(),
                },
            )],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("Annual Salary"));
        assert!(json.contains("no combobox"));
    }
}
