//! Basic filtering example
//!
//! Run with: cargo run --example basic_filtering

use mrposc_filter::{osc, AddressFilter, AddressTable, CallbackSink, OscMessage, TableConfig};
use std::sync::Arc;

fn main() {
    println!("=== MRP OSC Filter Example ===\n");

    // Example 1: The address table
    println!("1. Address table:");
    let table = AddressTable::mrp();
    for spec in table.iter().take(5) {
        println!("  {:<24} {}", spec.path, spec.args);
    }
    println!("  ... {} addresses total", table.len());

    // Example 2: Dispatch through callbacks
    println!("\n2. Dispatching:");
    let filter = AddressFilter::mrp();
    let sink = CallbackSink::new(
        |msg: OscMessage| println!("  accept -> {}", msg),
        |diagnostic: String| println!("  reject -> {}", diagnostic),
    );

    let messages = vec![
        osc!("/midi", 144, 90, 60),
        osc!("/ui/volume", 0.8),
        osc!("/ui/volume/foo"),
        osc!("/not/a/real/path", 1, 2, 3),
        OscMessage::from_atoms(Vec::new()),
    ];
    for msg in messages {
        filter.dispatch(msg, &sink);
    }

    // Example 3: A table from configuration
    println!("\n3. Configured table:");
    let config = TableConfig::example();
    match config.into_table() {
        Ok(table) => {
            let filter = AddressFilter::new(Arc::new(table));
            for address in ["/ui/status/thermal", "/ui/gate", "/ptrk/pitch"] {
                println!(
                    "  {:<20} accepted: {}",
                    address,
                    filter.classify(osc!(address)).is_accepted()
                );
            }
        }
        Err(e) => println!("  invalid table: {:#}", e),
    }
}
