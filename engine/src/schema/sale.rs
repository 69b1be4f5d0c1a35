//! Sale contract.

use super::{CompositeColumn, FieldSpec, RecordContract, RecordReader};
use crate::cleaners::{FieldKind, Rules};
use crate::models::{EntityKind, Sale, SaleStatus};

const SALE_STATUSES: [&str; 3] = ["Completed", "Pending", "Cancelled"];

/// Largest accepted gap between the amount and quantity × unit price.
const AMOUNT_TOLERANCE: f64 = 0.01;

const FIELDS: &[FieldSpec] = &[
    FieldSpec::required("id", FieldKind::Identifier).aliases(&["sale_id"]),
    FieldSpec::required("employee_id", FieldKind::Identifier)
        .aliases(&["seller_employee_id", "seller_id"]),
    FieldSpec::required("employee_name", FieldKind::PersonName).aliases(&["seller_name", "seller"]),
    FieldSpec::required("amount", FieldKind::Decimal)
        .aliases(&["total_price", "total", "total_amount"]),
    FieldSpec::required("date", FieldKind::Date).aliases(&["sale_date"]),
    FieldSpec::optional("product_id", FieldKind::Identifier),
    FieldSpec::optional("buyer_name", FieldKind::Text).aliases(&["buyer"]),
    FieldSpec::optional("quantity", FieldKind::Integer).aliases(&["qty"]),
    FieldSpec::optional("unit_price", FieldKind::Decimal).aliases(&["price"]),
    FieldSpec::optional("status", FieldKind::Category).aliases(&["sale_status"]),
];

const COMPOSITES: &[CompositeColumn] = &[CompositeColumn {
    name: "employee_name",
    parts: &["seller_first_name", "seller_last_name"],
    separator: " ",
}];

/// Schema of the sales ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaleContract;

impl RecordContract for SaleContract {
    type Instance = Sale;

    const ENTITY: EntityKind = EntityKind::Sale;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn composites() -> &'static [CompositeColumn] {
        COMPOSITES
    }

    fn build(r: &mut RecordReader<'_>, rules: &Rules) -> Option<Sale> {
        let id = r.identifier("id");
        let employee_id = r.identifier("employee_id");
        let employee_name = r.person_name("employee_name", &rules.name);
        let amount = r.decimal("amount", false);
        let date = r.date("date");
        let quantity = r.positive_integer("quantity");
        let unit_price = r.decimal("unit_price", false);
        let status = r.category("status", SaleStatus::from_label, &SALE_STATUSES);

        if let (Some(total), Some(q), Some(price)) = (amount, quantity, unit_price) {
            let expected = f64::from(q) * price;
            if (total - expected).abs() >= AMOUNT_TOLERANCE {
                r.inconsistent(
                    "amount",
                    format!("amount {total:.2} does not match quantity {q} x unit price {price:.2} = {expected:.2}"),
                );
            }
        }
        if let (Some(day), Some(reference)) = (date, rules.reference_date) {
            if day > reference {
                r.inconsistent("date", format!("sale date {day} is after {reference}"));
            }
        }

        Some(Sale {
            id: id?,
            employee_id: employee_id?,
            employee_name: employee_name?,
            amount: amount?,
            date: date?,
            product_id: r.identifier("product_id"),
            buyer_name: r.text("buyer_name"),
            quantity,
            unit_price,
            status,
        })
    }
}
