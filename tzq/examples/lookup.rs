//! Look up a few well-known places.
//!
//! Run with: cargo run --example lookup -- /path/to/timezones.json /path/to/timezones.geo.dat

use std::env;

use tzq::{to_offset, TzError, TzFinderBuilder};

#[tokio::main]
async fn main() -> Result<(), TzError> {
    let mut args = env::args().skip(1);
    let (Some(index), Some(geometry)) = (args.next(), args.next()) else {
        eprintln!("Usage: cargo run --example lookup -- <index> <geometry>");
        std::process::exit(1);
    };

    let finder = TzFinderBuilder::new(index, geometry).build()?;

    let places = [
        ("Los Angeles", 34.0522, -118.2437),
        ("Tokyo", 35.6762, 139.6503),
        ("London", 51.5074, -0.1278),
        ("Mid-Pacific", 0.0, -160.0),
        ("North Pole", 90.0, 0.0),
    ];

    for (name, lat, lon) in places {
        match finder.find(lat, lon).await {
            Ok(zones) => {
                let offsets: Vec<String> = zones
                    .iter()
                    .map(|z| match to_offset(z) {
                        Ok(minutes) => format!("{} ({:+}min)", z, minutes),
                        Err(_) => z.clone(),
                    })
                    .collect();
                println!("{}: {}", name, offsets.join(", "));
            }
            Err(e) => println!("{}: error - {}", name, e),
        }
    }

    let stats = finder.stats();
    println!("\nLookups: {}", stats.lookups);
    println!("  Id list hits: {}", stats.id_list_hits);
    println!("  Geometry hits: {}", stats.geometry_hits);
    println!("  Ocean fallbacks: {}", stats.ocean_fallbacks);

    Ok(())
}
