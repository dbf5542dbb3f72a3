extern crate serde;

use serde::{Serialize, Deserialize};
use super::{Column, Justification, LineItem, ReceiptDocument, SectionEntry, TableRow};

const ITEM_WIDTH: usize = 20;
const QUANTITY_WIDTH: usize = 5;
const PRICE_WIDTH: usize = 10;

/// A sold product line
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderLine {
    pub name: String,
    pub quantity: u32,
    /// Unit price
    pub price: f64
}

/// Point of sale order, as handed over by the checkout
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_number: String,
    pub date: String,
    pub time: String,
    pub items: Vec<OrderLine>,
    pub total: f64
}

/// Fixed texts of the shop receipt
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptTemplate {
    pub shop_name: String,
    pub title: String,
    pub thank_you: String
}

impl ReceiptTemplate {
    pub fn new<A: Into<String>>(shop_name: A) -> ReceiptTemplate {
        ReceiptTemplate {
            shop_name: shop_name.into(),
            title: "Receipt".to_string(),
            thank_you: "Thank you for shopping!".to_string()
        }
    }
}

impl ReceiptDocument {
    /// Lays out an order as a shop receipt
    ///
    /// ```rust
    /// use escpos_receipt::{Order, OrderLine, ReceiptDocument, ReceiptTemplate};
    ///
    /// let order = Order {
    ///     order_number: "1042".into(),
    ///     date: "2024-03-01".into(),
    ///     time: "10:15".into(),
    ///     items: vec![OrderLine { name: "Chicken".into(), quantity: 2, price: 4.5 }],
    ///     total: 9.0
    /// };
    /// let document = ReceiptDocument::from_order(&order, &ReceiptTemplate::new("TAAZA MEAT SHOP"));
    /// assert_eq!(document.items.len(), 1);
    /// ```
    pub fn from_order(order: &Order, template: &ReceiptTemplate) -> ReceiptDocument {
        let items = order.items.iter().map(|line| TableRow::from(vec![
            Column::new(line.name.as_str(), ITEM_WIDTH),
            Column::new(format!("{}x", line.quantity), QUANTITY_WIDTH).align(Justification::Right),
            Column::new(format!("{:.2}", line.price), PRICE_WIDTH).align(Justification::Right)
        ])).collect();

        ReceiptDocument {
            header: vec![
                LineItem::new(template.shop_name.as_str()).align(Justification::Center).bold().large().into(),
                LineItem::new(template.title.as_str()).align(Justification::Center).into(),
                SectionEntry::Divider
            ],
            order_info: vec![
                SectionEntry::text(format!("Order #: {}", order.order_number)),
                SectionEntry::text(format!("Date: {}", order.date)),
                SectionEntry::text(format!("Time: {}", order.time)),
                SectionEntry::Divider
            ],
            title: vec![
                LineItem::new("ITEMS").bold().into()
            ],
            table_header: vec![
                Column::new("Item", ITEM_WIDTH),
                Column::new("Qty", QUANTITY_WIDTH).align(Justification::Right),
                Column::new("Price", PRICE_WIDTH).align(Justification::Right)
            ].into(),
            items,
            summary: vec![
                SectionEntry::Divider,
                LineItem::new(format!("TOTAL: {:.2}", order.total)).align(Justification::Right).bold().into()
            ],
            footer: vec![
                SectionEntry::Divider,
                LineItem::new(template.thank_you.as_str()).align(Justification::Center).into(),
                SectionEntry::Spacer
            ]
        }
    }
}
