//! `splice config`: show configuration.

use splice_config::AppConfig;

pub fn show(defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if defaults {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = AppConfig::load()?;
    println!(
        "# {}",
        AppConfig::config_dir().join("config.toml").display()
    );
    print!("{}", config.to_toml());
    Ok(())
}
