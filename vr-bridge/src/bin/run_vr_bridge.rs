#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use vr_bridge::config::CliArgs;
use vr_bridge::{Backend, Bridge, BridgeConfig, VRServiceManager};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let config = BridgeConfig::resolve(&args).context("failed to load configuration")?;
    debug!("Configuration: {:?}", config);

    let stop_after = args.stop_after()?;

    let mut manager = VRServiceManager::new();
    match config.backend {
        Backend::OpenXr => register_openxr(&mut manager, &config)?,
        Backend::Mock => register_mock(&mut manager)?,
    }
    info!("Starting {} backend", config.backend);

    manager
        .initialize_with_retry(config.retry_policy())
        .context("could not connect to the VR runtime; check that SteamVR is running and the controllers are tracked")?;

    let mut bridge = Bridge::from_config(manager, &config).context("failed to open the relay socket")?;

    let stop = Arc::new(AtomicBool::new(false));
    if let Some(duration) = stop_after {
        let stop = stop.clone();
        thread::spawn(move || {
            thread::sleep(duration);
            stop.store(true, Ordering::Relaxed);
        });
    }

    let ticks = bridge.run(&stop).context("bridge stopped on a runtime error")?;
    info!("Bridge stopped after {} ticks", ticks);
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

#[cfg(feature = "openxr")]
fn register_openxr(manager: &mut VRServiceManager, config: &BridgeConfig) -> Result<()> {
    use std::time::Duration;
    use vr_bridge::api::{OpenXrServiceCreator, OpenXrSettings};
    use vr_bridge::VRServiceCreator;

    let settings = OpenXrSettings {
        application_name: config.application_name.clone(),
        warmup: Duration::from_millis(config.warmup_ms),
        ..Default::default()
    };
    manager.register(OpenXrServiceCreator::with_settings(settings).new_service());
    Ok(())
}

#[cfg(not(feature = "openxr"))]
fn register_openxr(_: &mut VRServiceManager, _: &BridgeConfig) -> Result<()> {
    anyhow::bail!("run-vr-bridge was built without the openxr feature")
}

#[cfg(feature = "mock")]
fn register_mock(manager: &mut VRServiceManager) -> Result<()> {
    manager.register_mock();
    Ok(())
}

#[cfg(not(feature = "mock"))]
fn register_mock(_: &mut VRServiceManager) -> Result<()> {
    anyhow::bail!("run-vr-bridge was built without the mock feature")
}
