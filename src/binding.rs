use serde::Serialize;

/// Static mapping from a form field's human-readable label to the workbook
/// cell holding its value. Immutable during a run.
#[derive(Debug, Clone, Serialize)]
pub struct Binding {
    /// Label text shown next to the field on the page.
    pub label: String,
    /// A1-style cell address in the workbook's first sheet.
    pub cell: String,
    /// Container element id, when known up front. Skips the structural scan.
    pub container_id: Option<String>,
}

impl Binding {
    pub fn new(label: impl Into<String>, cell: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cell: cell.into(),
            container_id: None,
        }
    }

    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = Some(id.into());
        self
    }
}

/// The compensation sheet's field map. Labels must match the page text; cells
/// point into the offer workbook.
pub fn offer_bindings() -> Vec<Binding> {
    [
        ("Annual Salary", "E21"),
        ("Pay Based on Frequency", "D6"),
        ("Basic Pay (Annual)", "E6"),
        ("House Rent Allowance (Monthly)", "D7"),
        ("House Rent Allowance (annual)", "E7"),
        ("General Allowance (Monthly)", "D8"),
        ("General Allowance (annual)", "E8"),
        ("Cash Salary (Monthly) Section", "D10"),
        ("Cash Salary (Annual) Section", "E10"),
        ("Employer PF Contribution (Monthly)", "D13"),
        ("Employer PF Contribution (annual)", "E13"),
        ("Total Base Salary (Monthly)", "D16"),
        ("Total Base Salary (Annual)", "E16"),
        ("Monthly Bonus", "D19"),
        ("Annual Bonus", "E19"),
        ("Total Cash Compensation (Monthly)", "D21"),
        ("Total Cash Compensation (Annual)", "E21"),
    ]
    .into_iter()
    .map(|(label, cell)| Binding::new(label, cell))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn labels_are_unique() {
        let bindings = offer_bindings();
        let labels: HashSet<_> = bindings.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels.len(), bindings.len());
    }

    #[test]
    fn covers_the_full_sheet() {
        assert_eq!(offer_bindings().len(), 17);
    }

    #[test]
    fn explicit_container_id_is_carried() {
        let b = Binding::new("Annual Salary", "E21").with_container_id("spl-form-element_42");
        assert_eq!(b.container_id.as_deref(), Some("spl-form-element_42"));
    }
}
