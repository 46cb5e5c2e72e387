use super::types::{BasicDetails, NOT_SPECIFIED};

const RESPONSIBILITIES: &str = "The leaseholder pays a share of the service charge, keeps the \
interior of the property in repair and needs consent before making alterations. The management \
company maintains and insures the structure and common parts of the building.";

/// Fixed template filled with property type, location and term.
pub fn executive_summary(details: &BasicDetails) -> String {
    let location = if details.location == NOT_SPECIFIED {
        "an unspecified location"
    } else {
        details.location.as_str()
    };
    let term = if details.lease_term == NOT_SPECIFIED {
        "not stated in the document".to_string()
    } else {
        details.lease_term.clone()
    };

    format!(
        "This lease relates to a {} in {location}. The lease term is {term}. {RESPONSIBILITIES}",
        details.property_type
    )
}
