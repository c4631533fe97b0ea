use crate::models::{SourceRow, Transaction};

/// Attach revenue, discount value, profit and profit margin to a source row.
///
/// `profit_margin` is NaN (or infinite) when revenue is zero; that is carried
/// through rather than treated as an error.
pub fn derive(source: SourceRow) -> Transaction {
    let revenue = source.price * source.quantity;
    let discount_value = revenue * source.discount;
    let profit = revenue - discount_value;
    let profit_margin = profit / revenue;
    Transaction {
        price: source.price,
        quantity: source.quantity,
        discount: source.discount,
        category: source.category,
        region: source.region,
        order_date: source.order_date,
        raw: source.raw,
        revenue,
        discount_value,
        profit,
        profit_margin,
    }
}

#[cfg(test)]
pub(crate) fn sample(price: f64, quantity: f64, discount: f64, category: &str, region: &str) -> Transaction {
    derive(SourceRow {
        price,
        quantity,
        discount,
        category: category.to_string(),
        region: region.to_string(),
        order_date: None,
        raw: vec![
            price.to_string(),
            quantity.to_string(),
            discount.to_string(),
            category.to_string(),
            region.to_string(),
        ],
    })
}
