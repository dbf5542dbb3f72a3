use escpos_receipt::{
    PrintSession, PrinterProfile, ReceiptDocument, ReceiptTemplate,
    Order, OrderLine
};

fn main() {
    // A json profile may be given as first argument
    let printer_profile = match std::env::args().nth(1) {
        Some(path) => match PrinterProfile::from_path(path) {
            Ok(printer_profile) => printer_profile,
            Err(e) => panic!("Error: {}", e)
        },
        None => PrinterProfile::default()
    };
    let session = match PrintSession::with_rusb(printer_profile) {
        Ok(session) => session,
        Err(e) => panic!("Error: {}", e)
    };
    match session.is_available() {
        Ok(availability) if availability.available => (),
        Ok(_) => panic!("No printer was found :("),
        Err(e) => panic!("Error: {}", e)
    }

    let order = Order {
        order_number: "1042".into(),
        date: "2024-03-01".into(),
        time: "10:15".into(),
        items: vec![
            OrderLine { name: "Chicken curry cut".into(), quantity: 2, price: 4.5 },
            OrderLine { name: "Mutton keema".into(), quantity: 1, price: 7.25 }
        ],
        total: 16.25
    };
    let document = ReceiptDocument::from_order(&order, &ReceiptTemplate::new("TAAZA MEAT SHOP"));
    match session.print_receipt(&document) {
        Ok(report) => println!("{}", report.message()),
        Err(e) => println!("Error: {}", e)
    }
}
