use serde::Deserialize;
use validator::Validate;

use crate::domain::cart::MAX_LINE_QUANTITY;

/// Quantity box submitted from the cart page.
#[derive(Debug, Deserialize, Validate)]
pub struct QuantityForm {
    #[validate(range(min = 1, max = MAX_LINE_QUANTITY))]
    pub quantity: i32,
}

impl QuantityForm {
    /// The requested quantity, or `None` when it is outside `1..=MAX_LINE_QUANTITY`.
    pub fn into_quantity(self) -> Option<i32> {
        self.validate().ok().map(|_| self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_quantities_within_the_line_cap() {
        assert_eq!(QuantityForm { quantity: 1 }.into_quantity(), Some(1));
        assert_eq!(
            QuantityForm {
                quantity: MAX_LINE_QUANTITY
            }
            .into_quantity(),
            Some(MAX_LINE_QUANTITY)
        );
    }

    #[test]
    fn rejects_zero_and_oversized_quantities() {
        assert_eq!(QuantityForm { quantity: 0 }.into_quantity(), None);
        assert_eq!(QuantityForm { quantity: -4 }.into_quantity(), None);
        assert_eq!(QuantityForm { quantity: i32::MAX }.into_quantity(), None);
    }

    #[test]
    fn parses_the_urlencoded_body() {
        let form: QuantityForm = serde_html_form::from_str("quantity=3").unwrap();
        assert_eq!(form.into_quantity(), Some(3));
    }
}
