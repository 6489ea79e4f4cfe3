use optstop_core::SimulationConfig;

pub fn run() {
    match serde_json::to_string_pretty(&SimulationConfig::default()) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing default config: {e}");
            std::process::exit(1);
        }
    }
}
