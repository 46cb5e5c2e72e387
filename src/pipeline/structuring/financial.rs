use std::sync::LazyLock;

use regex::Regex;

use super::types::{FinancialTerms, NOT_SPECIFIED};

pub const GROUND_RENT_FALLBACK: &str = "Nominal ground rent (e.g., one peppercorn per year)";

/// Service charges are budget-driven, so no amount is ever read from the lease.
pub const SERVICE_CHARGE_TERMS: &str =
    "Variable, based on the annual budget set by the management company";

/// `£1,250.00`, `£250`, `£ 99.50`
const AMOUNT: &str = r"£[ \t]?(\d{1,3}(?:,\d{3})+(?:\.\d{2})?|\d+(?:\.\d{2})?)";

static GROUND_RENT: LazyLock<Regex> = LazyLock::new(|| labelled_amount(r"(?:ground|yearly|annual)\s+rent"));

static DEPOSIT: LazyLock<Regex> = LazyLock::new(|| labelled_amount(r"deposit"));

fn labelled_amount(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{label}\s*(?:of\b|:|is\b|-)?\s*{AMOUNT}")).unwrap()
}

pub fn extract_financial_terms(text: &str) -> FinancialTerms {
    FinancialTerms {
        ground_rent: amount_after(&GROUND_RENT, text)
            .map(|amount| format!("£{amount} per annum"))
            .unwrap_or_else(|| GROUND_RENT_FALLBACK.to_string()),
        deposit: amount_after(&DEPOSIT, text)
            .map(|amount| format!("£{amount}"))
            .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
        service_charge: SERVICE_CHARGE_TERMS.to_string(),
    }
}

fn amount_after<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    pattern.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_amounts_extracted() {
        let terms = extract_financial_terms(
            "The Ground Rent of £250 is payable yearly. A deposit: £1,500.00 is held.",
        );
        assert_eq!(terms.ground_rent, "£250 per annum");
        assert_eq!(terms.deposit, "£1,500.00");
        assert_eq!(terms.service_charge, SERVICE_CHARGE_TERMS);
    }

    #[test]
    fn no_currency_uses_fallbacks() {
        let terms = extract_financial_terms("The ground rent is one peppercorn if demanded");
        assert_eq!(terms.ground_rent, GROUND_RENT_FALLBACK);
        assert_eq!(terms.deposit, NOT_SPECIFIED);
    }

    #[test]
    fn amount_must_follow_label() {
        let terms = extract_financial_terms("Insurance costs £400. The ground rent is payable annually.");
        assert_eq!(terms.ground_rent, GROUND_RENT_FALLBACK);
    }

    #[test]
    fn label_variants() {
        assert_eq!(
            extract_financial_terms("annual rent - £ 99.50").ground_rent,
            "£99.50 per annum"
        );
        assert_eq!(
            extract_financial_terms("YEARLY RENT: £10").ground_rent,
            "£10 per annum"
        );
    }
}
