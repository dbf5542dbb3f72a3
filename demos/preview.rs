use escpos_receipt::{Formatter, PrinterProfile, ReceiptDocument};

fn main() {
    let json = r#"{
        "header": [{"text": "SHOP", "align": "center", "bold": true, "size": "large"}],
        "orderInfo": [{"text": "Order #: 7"}, {"type": "divider"}],
        "tableHeader": [{"text": "Item", "width": 20}, {"text": "Qty", "align": "right", "width": 5}],
        "items": [
            [{"text": "Coffee", "width": 20}, {"text": "2x", "align": "right", "width": 5}],
            [{"text": "Croissant with a very long name", "width": 20}, {"text": "1x", "align": "right", "width": 5}]
        ],
        "summary": [{"type": "divider"}, {"text": "TOTAL: 7.50", "align": "right", "bold": true}],
        "footer": [{"text": "Thank you for shopping!", "align": "center"}, {"type": "spacer"}]
    }"#;
    let document = match ReceiptDocument::from_json_str(json) {
        Ok(document) => document,
        Err(e) => panic!("Error: {}", e)
    };
    // Same text a 58mm printer would print
    let printer_profile = PrinterProfile::builder()
        .with_paper_columns(32)
        .build();
    print!("{}", Formatter::from_profile(&printer_profile).preview(&document));
}
