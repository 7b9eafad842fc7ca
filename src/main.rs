use magdist::configuration::Configuration;
use magdist::magdist::magfreqdist::MagFreqDist;
use magdist::manager::manager::IManager;

const DEFAULT_CONFIG_PATH: &str = "json/config.json";

fn main() {
    tracing_subscriber::fmt().init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let config = Configuration::new();
    config.from_reader(&config_path).unwrap();

    let manager = config.mag_freq_dist_manager();
    for name in manager.names() {
        let dist = manager.get(&name).unwrap();
        println!("{}: {}", name, dist.info());
        for index in 0..dist.num() {
            println!(
                "{:.2}, {:.6e}, {:.6e}, {:.6e}",
                dist.series().x_at(index),
                dist.incremental_rate_at(index).unwrap(),
                dist.cumulative_rate_at(index).unwrap(),
                dist.moment_rate_at(index).unwrap()
            );
        }
        println!(
            "total cumulative rate: {:.6e}, total moment rate: {:.6e}",
            dist.total_incremental_rate(),
            dist.total_moment_rate()
        );
    }
}
