/// Example program to print the loaded configuration
///
/// Run with: cargo run -p segue-config --example print_config

fn main() {
    // Load configuration from segue.toml
    let config = segue_config::SegueConfig::load();

    println!("=== Segue Configuration ===\n");

    println!("Timing Settings:");
    println!("  Delay: {} ms", config.timing.delay_ms);
    println!("  Duration: {} ms", config.timing.duration_ms);
    println!("  Ease: {:?}", config.timing.ease);
    println!();

    println!("Demo Settings:");
    println!("  Frame Interval: {} ms", config.demo.frame_interval_ms);
    println!("  Frames: {}", config.demo.frames);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
