//! Panning strategy listing.

use spatia_scene::PanningStrategy;

pub fn run() -> anyhow::Result<()> {
    println!("Panning Strategies");
    println!("==================\n");
    for strategy in PanningStrategy::ALL {
        println!("  {:<12} {} channel(s)", strategy.name(), strategy.channels());
    }
    Ok(())
}
